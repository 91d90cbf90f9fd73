// Evaluation module
// K-fold cross-validation, accuracy metrics and report output

pub mod cross_validate;
pub mod folds;
pub mod metrics;
pub mod report;

use thiserror::Error;

use crate::classify::ClassifierError;
use crate::dataset::StoreError;

pub use cross_validate::{cross_validate, feature_matrix};
pub use folds::{FoldSplit, KFold};
pub use metrics::{AccuracySummary, EvaluationReport, FoldResult, FoldScores, SubsetAccuracy};
pub use report::{format_report, write_report};

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Cannot evaluate an empty example store")]
    EmptyStore,

    #[error("{examples} examples cannot be split into {folds} folds")]
    TooFewExamples { examples: usize, folds: usize },

    #[error("Fold count must be at least 2, got {0}")]
    InvalidFolds(usize),

    #[error("Example {index} has {actual} feature values, expected {expected}")]
    InconsistentFeatureLength {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
