// Gaitfold - Gait event windows to cross-validated locomotion-mode classifiers
// Module declarations

pub mod channels;
pub mod classify;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod evaluation;
pub mod events;
pub mod features;
pub mod state;
pub mod trial;

pub use commands::{run_experiment, run_sweep, CommandError, DatasetSource, ExperimentOutcome};
pub use config::{DatasetConfig, EvaluationConfig, ExperimentConfig};
