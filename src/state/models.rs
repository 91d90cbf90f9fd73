// Data models for the experiment run ledger
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One evaluated configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub classifier: String,
    pub laterality: String,
    pub sensors: String,
    pub window_size: i64,
    pub folds: i64,
    pub seed: i64,
    pub example_count: i64,
    pub status: RunStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl RunStatus {
    pub fn to_string(&self) -> String {
        match self {
            RunStatus::Pending => "pending".to_string(),
            RunStatus::Processing => "processing".to_string(),
            RunStatus::Complete => "complete".to_string(),
            RunStatus::Failed => "failed".to_string(),
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "pending" => RunStatus::Pending,
            "processing" => RunStatus::Processing,
            "complete" => RunStatus::Complete,
            "failed" => RunStatus::Failed,
            _ => RunStatus::Pending,
        }
    }
}

/// Per-fold accuracies; `None` marks an undefined sub-population accuracy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldScoreRecord {
    pub run_id: Uuid,
    pub fold: i64,
    pub overall: Option<f64>,
    pub steady_state: Option<f64>,
    pub transitional: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunWithScores {
    pub run: Run,
    pub scores: Vec<FoldScoreRecord>,
}
