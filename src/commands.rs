// Experiment commands
// Build or restore the example store, cross-validate, write the report and record the run

use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::channels::ModalitySet;
use crate::config::{ConfigError, ExperimentConfig};
use crate::dataset::{
    build_dataset, load_checkpoint, save_checkpoint, CheckpointError, DatasetError, ExampleStore,
};
use crate::evaluation::{cross_validate, write_report, EvaluationError, EvaluationReport};
use crate::state::storage::{self, StorageError};
use crate::state::{self, DbConnection, DbError, FoldScoreRecord, RunStatus};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("No examples were produced for {0}")]
    EmptyDataset(String),
}

type CommandResult<T> = Result<T, CommandError>;

/// Where the example store of a run comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetSource {
    /// Build from trial files and save a fresh checkpoint
    #[default]
    Rebuild,

    /// Reuse the checkpoint saved by an earlier run
    LoadCheckpoint,
}

/// Result of one evaluated configuration
#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    pub run_id: Uuid,
    pub stem: String,
    pub example_count: usize,
    pub report: EvaluationReport,
    pub report_path: PathBuf,
    pub checkpoint_path: PathBuf,
}

fn obtain_store(
    config: &ExperimentConfig,
    source: DatasetSource,
    checkpoint: &Path,
) -> CommandResult<ExampleStore> {
    let mut store = match source {
        DatasetSource::LoadCheckpoint => load_checkpoint(checkpoint)?,
        DatasetSource::Rebuild => {
            let store = build_dataset(&config.dataset)?;
            if !store.is_empty() {
                save_checkpoint(&store, checkpoint)?;
            }
            store
        }
    };

    // Checkpoints hold raw features; the transform is reapplied on every load
    if let Some(kind) = config.dataset.retrieval_transform {
        store.set_transform(kind.build());
    }
    Ok(store)
}

fn fold_records(run_id: Uuid, report: &EvaluationReport) -> Vec<FoldScoreRecord> {
    report
        .folds
        .iter()
        .map(|f| FoldScoreRecord {
            run_id,
            fold: f.fold as i64,
            overall: f.scores.overall.value(),
            steady_state: f.scores.steady_state.value(),
            transitional: f.scores.transitional.value(),
        })
        .collect()
}

/// Cross-validate a created run and record its report, scores and status
fn evaluate_run(
    config: &ExperimentConfig,
    store: &ExampleStore,
    db: &DbConnection,
    run_id: Uuid,
    report_path: &Path,
) -> CommandResult<EvaluationReport> {
    state::update_run_status(db, &run_id, RunStatus::Processing)?;
    let report = cross_validate(store, &config.evaluation)?;
    write_report(&report, report_path)?;
    state::record_fold_scores(db, &fold_records(run_id, &report))?;
    state::update_run_status(db, &run_id, RunStatus::Complete)?;
    Ok(report)
}

/// Evaluate one classifier / laterality / sensor configuration end to end
pub fn run_experiment(
    config: &ExperimentConfig,
    source: DatasetSource,
    db: &DbConnection,
) -> CommandResult<ExperimentOutcome> {
    config.validate()?;

    let classifier = config.evaluation.classifier;
    let root = storage::output_root(config.output_dir.as_deref())?;
    let stem = storage::experiment_stem(
        classifier,
        config.dataset.laterality,
        &config.dataset.modalities,
    );
    let checkpoint_path = storage::checkpoint_path(&root, classifier, &stem);
    let report_path = storage::results_path(&root, classifier, &stem);

    log::info!("Starting {}", stem);

    let store = obtain_store(config, source, &checkpoint_path)?;
    if store.is_empty() {
        return Err(CommandError::EmptyDataset(stem));
    }

    let run = state::create_run(
        db,
        classifier.as_str(),
        config.dataset.laterality.as_str(),
        &config.dataset.modalities.label(),
        config.dataset.window_size,
        config.evaluation.folds,
        config.evaluation.seed,
        store.len(),
    )?;

    let report = match evaluate_run(config, &store, db, run.id, &report_path) {
        Ok(report) => report,
        Err(e) => {
            log::error!("{} failed: {}", stem, e);
            if let Err(status_err) = state::update_run_status(db, &run.id, RunStatus::Failed) {
                log::warn!("Could not mark run {} failed: {}", run.id, status_err);
            }
            return Err(e);
        }
    };

    log::info!("SUMMARY {} total: {}", stem, report.overall_summary());
    log::info!("SUMMARY {} steadystate: {}", stem, report.steady_state_summary());
    log::info!("SUMMARY {} transitional: {}", stem, report.transitional_summary());

    Ok(ExperimentOutcome {
        run_id: run.id,
        stem,
        example_count: store.len(),
        report,
        report_path,
        checkpoint_path,
    })
}

/// Run the configured sensor set, or every non-empty subset of
/// {imu, emg, goin} (smallest first) when `all_combinations` is set.
/// The sweep ignores the configured modalities.
pub fn run_sweep(
    config: &ExperimentConfig,
    source: DatasetSource,
    db: &DbConnection,
    all_combinations: bool,
) -> CommandResult<Vec<ExperimentOutcome>> {
    let sets: Vec<ModalitySet> = if all_combinations {
        ModalitySet::all().combinations(1)
    } else {
        vec![config.dataset.modalities.clone()]
    };

    let mut outcomes = Vec::with_capacity(sets.len());
    for modalities in sets {
        let mut run_config = config.clone();
        run_config.dataset.modalities = modalities;
        outcomes.push(run_experiment(&run_config, source, db)?);
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Modality;
    use crate::dataset::{Example, TransformKind};
    use crate::events::SampleType;
    use crate::features::FeatureTensor;
    use ndarray::Array2;
    use tempfile::TempDir;

    #[test]
    fn test_missing_checkpoint_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = ExperimentConfig {
            output_dir: Some(dir.path().to_path_buf()),
            ..ExperimentConfig::default()
        };
        let db = DbConnection::open_in_memory().unwrap();

        let result = run_experiment(&config, DatasetSource::LoadCheckpoint, &db);
        assert!(matches!(
            result,
            Err(CommandError::Checkpoint(CheckpointError::Missing(_)))
        ));
        assert!(state::list_runs(&db).unwrap().is_empty());
    }

    #[test]
    fn test_empty_dataset_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = ExperimentConfig {
            output_dir: Some(dir.path().join("out")),
            ..ExperimentConfig::default()
        };
        config.dataset.data_dir = dir.path().join("no-data");
        config.dataset.modalities = ModalitySet::new([Modality::Emg]);
        let db = DbConnection::open_in_memory().unwrap();

        let result = run_experiment(&config, DatasetSource::Rebuild, &db);
        assert!(matches!(result, Err(CommandError::EmptyDataset(stem)) if stem == "LDA_bilateral_emg"));
    }

    #[test]
    fn test_configured_transform_applies_to_loaded_store() {
        let dir = TempDir::new().unwrap();
        let checkpoint = dir.path().join("store.json");

        let raw = Array2::from_shape_vec((1, 3), vec![-2.0, 0.0, 6.0]).unwrap();
        let mut saved = ExampleStore::new();
        saved.push(Example {
            feature: FeatureTensor::TimeSeries(raw),
            label: 1,
            sample_type: SampleType::SteadyState,
        });
        save_checkpoint(&saved, &checkpoint).unwrap();

        let mut config = ExperimentConfig::default();
        config.dataset.retrieval_transform = Some(TransformKind::MinMaxScale { max: 1.0 });

        let store = obtain_store(&config, DatasetSource::LoadCheckpoint, &checkpoint).unwrap();
        let (feature, _) = store.get(0).unwrap();
        assert_eq!(feature.flatten(), vec![0.0, 0.25, 1.0]);
        assert_eq!(store.get_example(0).unwrap().feature.flatten(), vec![-2.0, 0.0, 6.0]);
    }
}
