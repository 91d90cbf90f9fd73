// File system layout for results, checkpoints and the run ledger
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::channels::{LateralityMode, ModalitySet};
use crate::classify::ClassifierKind;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to get app data directory")]
    NoAppDataDir,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Ledger database file name inside the output root
pub const LEDGER_FILE: &str = "gaitfold.db";

/// Resolve the output root, falling back to the user data directory
pub fn output_root(configured: Option<&Path>) -> StorageResult<PathBuf> {
    let root = match configured {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_dir()
            .ok_or(StorageError::NoAppDataDir)?
            .join("gaitfold"),
    };
    fs::create_dir_all(&root)?;
    Ok(root)
}

/// `<CLS>_<laterality>_<sensors>`, e.g. `LDA_bilateral_imu_emg`
pub fn experiment_stem(
    classifier: ClassifierKind,
    laterality: LateralityMode,
    modalities: &ModalitySet,
) -> String {
    format!(
        "{}_{}_{}",
        classifier.as_str(),
        laterality.as_str(),
        modalities.label()
    )
}

/// `<root>/results/<CLS>/<stem>_accuracy.txt`
pub fn results_path(root: &Path, classifier: ClassifierKind, stem: &str) -> PathBuf {
    root.join("results")
        .join(classifier.as_str())
        .join(format!("{}_accuracy.txt", stem))
}

/// `<root>/checkpoints/<CLS>/<stem>.json`
pub fn checkpoint_path(root: &Path, classifier: ClassifierKind, stem: &str) -> PathBuf {
    root.join("checkpoints")
        .join(classifier.as_str())
        .join(format!("{}.json", stem))
}

pub fn ledger_path(root: &Path) -> PathBuf {
    root.join(LEDGER_FILE)
}

/// Write a file, creating parent directories; returns its SHA256 hash
pub fn store_file(path: &Path, data: &[u8]) -> StorageResult<String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(path)?;
    file.write_all(data)?;

    Ok(calculate_sha256(data))
}

/// Read a file from disk
pub fn read_file(path: &Path) -> StorageResult<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
