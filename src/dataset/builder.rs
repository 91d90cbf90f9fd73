// Dataset builder
// Runs ingest, event extraction, channel selection, windowing and feature
// transformation over every configured trial

use thiserror::Error;

use crate::channels::ChannelSelector;
use crate::config::DatasetConfig;
use crate::dataset::store::{Example, ExampleStore};
use crate::events::extract_events;
use crate::features::{extract_window, FeatureTransformer, SpectrogramError};
use crate::trial::{load_trial, trial_path, TrialError, TrialTable};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Trial error: {0}")]
    Trial(#[from] TrialError),

    #[error("Feature transform error: {0}")]
    Spectrogram(#[from] SpectrogramError),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Examples produced from one trial, appended to the store as a unit
#[derive(Debug, Default)]
pub struct TrialBatch {
    pub subject: String,
    pub trial: u32,
    pub examples: Vec<Example>,

    /// Events found in the trial, kept or not
    pub events_seen: usize,
}

impl TrialBatch {
    pub fn new(subject: &str, trial: u32) -> Self {
        TrialBatch {
            subject: subject.to_string(),
            trial,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Events that did not yield an example (window out of bounds)
    pub fn dropped(&self) -> usize {
        self.events_seen.saturating_sub(self.examples.len())
    }
}

/// Incremental store construction, one trial at a time
#[derive(Debug)]
pub struct DatasetBuilder {
    config: DatasetConfig,
    transformer: FeatureTransformer,
    store: ExampleStore,
}

impl DatasetBuilder {
    pub fn new(config: DatasetConfig) -> DatasetResult<Self> {
        let transformer = FeatureTransformer::new(&config.representation)?;
        Ok(DatasetBuilder {
            config,
            transformer,
            store: ExampleStore::new(),
        })
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Examples appended so far
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Turn a parsed trial into a batch without touching the store
    pub fn process_trial(
        &self,
        subject: &str,
        trial: u32,
        table: &TrialTable,
    ) -> DatasetResult<TrialBatch> {
        let mut batch = TrialBatch::new(subject, trial);
        let selector = ChannelSelector::new(
            table.headers(),
            self.config.laterality,
            &self.config.modalities,
        );

        let events = extract_events(table);
        batch.events_seen = events.len();

        for event in &events {
            let Some(window) = extract_window(table, event, self.config.window_size, &selector)
            else {
                continue;
            };

            let feature = self.transformer.transform(&window)?;
            batch.examples.push(Example {
                feature,
                label: event.label(self.config.label_scheme),
                sample_type: event.sample_type(),
            });
        }

        Ok(batch)
    }

    /// Process a trial and append its examples; returns the batch size
    pub fn add_trial(&mut self, subject: &str, trial: u32, table: &TrialTable) -> DatasetResult<usize> {
        let batch = self.process_trial(subject, trial, table)?;

        log::debug!(
            "AB{} trial {:03}: {} examples from {} events ({} dropped)",
            subject,
            trial,
            batch.len(),
            batch.events_seen,
            batch.dropped()
        );

        Ok(self.store.append_batch(batch.examples))
    }

    pub fn finish(self) -> ExampleStore {
        self.store
    }
}

/// Build the example store from every configured subject and trial
///
/// Subjects are visited in configured order, trials in ascending order.
/// A trial file that does not exist is skipped with a warning.
pub fn build_dataset(config: &DatasetConfig) -> DatasetResult<ExampleStore> {
    let mut builder = DatasetBuilder::new(config.clone())?;
    let mut trials_loaded = 0usize;

    for subject in &config.subjects {
        for trial in config.trial_range.iter() {
            let path = trial_path(&config.data_dir, subject, trial);
            if !path.exists() {
                log::warn!("Trial file not found, skipping: {}", path.display());
                continue;
            }

            let table = load_trial(&path)?;
            builder.add_trial(subject, trial, &table)?;
            trials_loaded += 1;
        }
    }

    let store = builder.finish();
    log::info!(
        "load dataset done: {} examples from {} trials",
        store.len(),
        trials_loaded
    );

    Ok(store)
}
