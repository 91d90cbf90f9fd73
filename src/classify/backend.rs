// Classifier backend abstraction
// Common fit/predict interface and the two evaluation strategies (LDA, linear SVM)

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::classify::lda::LdaClassifier;
use crate::classify::preprocess::{Pca, Pipeline, StandardScaler};
use crate::classify::svm::{LinearSvm, SvmParams};
use crate::config::EvaluationConfig;

/// Classification strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Standardize, PCA to 95% variance, linear discriminant analysis
    Lda,

    /// Standardize, one-vs-one linear SVM
    Svm,
}

impl ClassifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierKind::Lda => "LDA",
            ClassifierKind::Svm => "SVM",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lda" => Ok(ClassifierKind::Lda),
            "svm" => Ok(ClassifierKind::Svm),
            other => Err(format!("unknown classifier: {}", other)),
        }
    }
}

/// Errors that can occur during training or prediction
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("Feature matrix has {rows} rows but {labels} labels were given")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("Expected {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("Model used before fit")]
    NotFitted,

    #[error("Linear algebra failure: {0}")]
    LinearAlgebra(String),
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Supervised classifier over dense `[samples x features]` matrices
pub trait Classifier {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[u8]) -> ClassifierResult<()>;

    fn predict(&self, x: &DMatrix<f64>) -> ClassifierResult<Vec<u8>>;

    fn name(&self) -> &'static str;
}

/// Shared input checks for `fit`
pub(crate) fn check_training_set(x: &DMatrix<f64>, y: &[u8]) -> ClassifierResult<()> {
    if x.nrows() == 0 {
        return Err(ClassifierError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(ClassifierError::LabelCountMismatch {
            rows: x.nrows(),
            labels: y.len(),
        });
    }
    Ok(())
}

/// Sorted distinct labels
pub(crate) fn distinct_classes(y: &[u8]) -> Vec<u8> {
    let mut classes = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Fresh, unfitted model for the selected strategy
pub fn build_classifier(kind: ClassifierKind, config: &EvaluationConfig) -> Box<dyn Classifier> {
    match kind {
        ClassifierKind::Lda => Box::new(Pipeline::new(
            vec![
                Box::new(StandardScaler::new()),
                Box::new(Pca::new(config.pca_variance)),
            ],
            Box::new(LdaClassifier::new()),
        )),
        ClassifierKind::Svm => Box::new(Pipeline::new(
            vec![Box::new(StandardScaler::new())],
            Box::new(LinearSvm::new(SvmParams {
                c: config.svm_c,
                max_iter: config.svm_max_iter,
                tol: config.svm_tol,
                seed: config.seed,
            })),
        )),
    }
}
