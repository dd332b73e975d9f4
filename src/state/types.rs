use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Processing,
    Completed,
    Error,
}

/// Point-in-time view of the processing status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: RunStatus,
    pub last_message: String,
    pub last_run_time: Option<DateTime<Utc>>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            status: RunStatus::Idle,
            last_message: "Not started yet.".to_string(),
            last_run_time: None,
        }
    }
}
