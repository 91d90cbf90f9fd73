// Classification module
// Linear classifiers and preprocessing used by cross-validation

pub mod backend;
pub mod lda;
pub mod preprocess;
pub mod svm;

pub use backend::{build_classifier, Classifier, ClassifierError, ClassifierKind, ClassifierResult};
pub use lda::LdaClassifier;
pub use preprocess::{Pca, Pipeline, Preprocessor, StandardScaler};
pub use svm::{LinearSvm, SvmParams};
