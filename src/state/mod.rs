// State management module
// Run ledger persistence and output file layout

pub mod db;
pub mod models;
pub mod queries;
pub mod storage;

pub use db::{init_db, DbConnection, DbError};
pub use models::{FoldScoreRecord, Run, RunStatus, RunWithScores};
pub use queries::{
    create_run, get_run, get_run_with_scores, list_fold_scores, list_runs, record_fold_scores,
    update_run_status,
};
pub use storage::StorageError;
