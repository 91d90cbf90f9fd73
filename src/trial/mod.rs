// Trial data module
// Handles locating and parsing per-subject trial recordings

pub mod ingest;

pub use ingest::{load_trial, parse_trial, trial_path, TrialError, TrialTable};
