// Experiment configuration
// Dataset build and evaluation settings, loadable from a JSON file

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::channels::{LateralityMode, ModalitySet};
use crate::classify::ClassifierKind;
use crate::dataset::TransformKind;
use crate::events::LabelScheme;
use crate::features::Representation;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Half-open range of circuit trial numbers, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRange {
    pub start: u32,
    pub end: u32,
}

impl TrialRange {
    pub fn iter(&self) -> std::ops::Range<u32> {
        self.start..self.end
    }
}

/// How the example store is built from raw trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Root containing `AB<subject>/Processed/...` trial files
    pub data_dir: PathBuf,

    pub subjects: Vec<String>,

    pub trial_range: TrialRange,

    /// Samples per window
    pub window_size: usize,

    pub representation: Representation,

    pub label_scheme: LabelScheme,

    pub modalities: ModalitySet,

    pub laterality: LateralityMode,

    /// Applied to features when they are read back from the store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_transform: Option<TransformKind>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            data_dir: PathBuf::from("./Data"),
            subjects: ["156", "185", "186", "188", "189", "190", "191", "192", "193", "194"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            trial_range: TrialRange { start: 1, end: 10 },
            window_size: 500,
            representation: Representation::default(),
            label_scheme: LabelScheme::Terminal,
            modalities: ModalitySet::all(),
            laterality: LateralityMode::Bilateral,
            retrieval_transform: None,
        }
    }
}

/// Cross-validation and classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub classifier: ClassifierKind,

    /// Number of k-fold splits
    pub folds: usize,

    /// Seed for fold shuffling and SVM sample order
    pub seed: u64,

    /// Cumulative explained-variance ratio kept by PCA (LDA only)
    pub pca_variance: f64,

    /// Soft-margin penalty of the linear SVM
    pub svm_c: f64,

    /// Maximum passes of the SVM solver over the training set
    pub svm_max_iter: usize,

    /// Stopping tolerance on the SVM projected gradient
    pub svm_tol: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            classifier: ClassifierKind::Lda,
            folds: 10,
            seed: 0,
            pca_variance: 0.95,
            svm_c: 10.0,
            svm_max_iter: 1000,
            svm_tol: 1e-3,
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub dataset: DatasetConfig,

    pub evaluation: EvaluationConfig,

    /// Root for results/, checkpoints/ and the run ledger
    /// Falls back to the user data directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl ExperimentConfig {
    /// Load configuration from a JSON file; missing keys take defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read(path)?;
        Self::from_json_bytes(&data)
    }

    pub fn from_json_bytes(data: &[u8]) -> Result<Self, ConfigError> {
        let config: ExperimentConfig = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.window_size == 0 {
            return Err(ConfigError::Invalid("window_size must be > 0".into()));
        }
        if self.dataset.modalities.is_empty() {
            return Err(ConfigError::Invalid("at least one sensor modality is required".into()));
        }
        if self.evaluation.folds < 2 {
            return Err(ConfigError::Invalid("folds must be at least 2".into()));
        }
        if !(0.0..=1.0).contains(&self.evaluation.pca_variance) || self.evaluation.pca_variance == 0.0 {
            return Err(ConfigError::Invalid("pca_variance must be in (0, 1]".into()));
        }
        if self.evaluation.svm_c <= 0.0 {
            return Err(ConfigError::Invalid("svm_c must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Modality;

    #[test]
    fn test_default_config() {
        let config = ExperimentConfig::default();
        assert_eq!(config.dataset.window_size, 500);
        assert_eq!(config.dataset.subjects.len(), 10);
        assert_eq!(config.evaluation.folds, 10);
        assert_eq!(config.evaluation.classifier, ClassifierKind::Lda);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = br#"{
            "dataset": { "window_size": 250, "modalities": ["emg", "gon"], "laterality": "ipsilateral" },
            "evaluation": { "classifier": "svm", "folds": 5 }
        }"#;

        let config = ExperimentConfig::from_json_bytes(json).unwrap();
        assert_eq!(config.dataset.window_size, 250);
        assert_eq!(
            config.dataset.modalities,
            ModalitySet::new([Modality::Emg, Modality::Goin])
        );
        assert_eq!(config.dataset.laterality, LateralityMode::Ipsilateral);
        assert_eq!(config.evaluation.classifier, ClassifierKind::Svm);
        assert_eq!(config.evaluation.folds, 5);
        assert_eq!(config.evaluation.svm_c, 10.0);
        assert_eq!(config.dataset.trial_range, TrialRange { start: 1, end: 10 });
        assert_eq!(config.dataset.retrieval_transform, None);
    }

    #[test]
    fn test_retrieval_transform_from_json() {
        let json = br#"{ "dataset": { "retrieval_transform": { "kind": "min_max_scale", "max": 255.0 } } }"#;
        let config = ExperimentConfig::from_json_bytes(json).unwrap();
        assert_eq!(
            config.dataset.retrieval_transform,
            Some(TransformKind::MinMaxScale { max: 255.0 })
        );
    }

    #[test]
    fn test_round_trip_json() {
        let mut config = ExperimentConfig::default();
        config.dataset.representation = Representation::TimeSeries;
        config.output_dir = Some(PathBuf::from("/tmp/out"));

        let bytes = config.to_json_bytes().unwrap();
        let parsed = ExperimentConfig::from_json_bytes(&bytes).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_folds_rejected() {
        let json = br#"{ "evaluation": { "folds": 1 } }"#;
        assert!(matches!(
            ExperimentConfig::from_json_bytes(json),
            Err(ConfigError::Invalid(_))
        ));
    }
}
