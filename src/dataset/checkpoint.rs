// Example store checkpoints
// JSON snapshot of a built store with a SHA256 sidecar for integrity checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::dataset::store::ExampleStore;
use crate::state::storage::{calculate_sha256, read_file, store_file, StorageError};

/// Bumped when the stored example layout changes
pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint not found: {0}")]
    Missing(PathBuf),

    #[error("Checkpoint IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checkpoint digest mismatch: expected {expected}, found {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("Unsupported checkpoint format version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize)]
struct CheckpointRef<'a> {
    format_version: u32,
    created_at: DateTime<Utc>,
    store: &'a ExampleStore,
}

#[derive(Deserialize)]
struct CheckpointFile {
    format_version: u32,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
    store: ExampleStore,
}

/// `<checkpoint>.sha256`
pub fn digest_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Write `store` to `path` plus a digest sidecar; returns the digest
pub fn save_checkpoint(store: &ExampleStore, path: &Path) -> Result<String, CheckpointError> {
    let envelope = CheckpointRef {
        format_version: CHECKPOINT_FORMAT_VERSION,
        created_at: Utc::now(),
        store,
    };
    let data = serde_json::to_vec(&envelope)?;

    let digest = store_file(path, &data)?;
    store_file(&digest_path(path), digest.as_bytes())?;

    log::info!(
        "Saved checkpoint with {} examples to {}",
        store.len(),
        path.display()
    );
    Ok(digest)
}

/// Load a store written by [`save_checkpoint`]
///
/// The sidecar digest is verified when present. The loaded store has no
/// retrieval transform set.
pub fn load_checkpoint(path: &Path) -> Result<ExampleStore, CheckpointError> {
    if !path.exists() {
        return Err(CheckpointError::Missing(path.to_path_buf()));
    }

    let data = read_file(path)?;

    let sidecar = digest_path(path);
    if sidecar.exists() {
        let expected = String::from_utf8_lossy(&read_file(&sidecar)?).trim().to_string();
        let actual = calculate_sha256(&data);
        if expected != actual {
            return Err(CheckpointError::DigestMismatch { expected, actual });
        }
    } else {
        log::warn!("No digest sidecar for {}, skipping verification", path.display());
    }

    let file: CheckpointFile = serde_json::from_slice(&data)?;
    if file.format_version != CHECKPOINT_FORMAT_VERSION {
        return Err(CheckpointError::UnsupportedVersion(file.format_version));
    }

    log::info!(
        "Loaded checkpoint with {} examples from {}",
        file.store.len(),
        path.display()
    );
    Ok(file.store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::store::Example;
    use crate::events::SampleType;
    use crate::features::FeatureTensor;
    use ndarray::Array2;
    use tempfile::TempDir;

    fn sample_store() -> ExampleStore {
        let mut store = ExampleStore::new();
        store.push(Example {
            feature: FeatureTensor::Spectrogram(vec![
                Array2::from_shape_fn((4, 3), |(r, c)| (r * 3 + c) as f32 - 40.5),
                Array2::from_elem((4, 3), -80.0),
            ]),
            label: 4,
            sample_type: SampleType::Transitional,
        });
        store.push(Example {
            feature: FeatureTensor::TimeSeries(Array2::from_elem((2, 5), 0.125)),
            label: 0,
            sample_type: SampleType::SteadyState,
        });
        store
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoints").join("LDA").join("run.json");
        let store = sample_store();

        let digest = save_checkpoint(&store, &path).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest_path(&path).exists());

        let loaded = load_checkpoint(&path).unwrap();
        assert_eq!(loaded.len(), store.len());
        for i in 0..store.len() {
            assert_eq!(loaded.get(i).unwrap(), store.get(i).unwrap());
            assert_eq!(
                loaded.get_example(i).unwrap().sample_type,
                store.get_example(i).unwrap().sample_type
            );
        }
    }

    #[test]
    fn test_missing_checkpoint() {
        let dir = TempDir::new().unwrap();
        let result = load_checkpoint(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(CheckpointError::Missing(_))));
    }

    #[test]
    fn test_tampered_checkpoint_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.json");
        save_checkpoint(&sample_store(), &path).unwrap();

        let mut data = std::fs::read(&path).unwrap();
        data.extend_from_slice(b" ");
        std::fs::write(&path, data).unwrap();

        assert!(matches!(
            load_checkpoint(&path),
            Err(CheckpointError::DigestMismatch { .. })
        ));
    }
}
