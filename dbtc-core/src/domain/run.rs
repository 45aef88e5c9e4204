//! Run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::RunStatus;

/// Identity of a triggered run
///
/// Created once when the trigger call succeeds and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHandle {
    pub account_id: String,
    pub job_id: String,
    pub run_id: i64,
    /// Browser URL of the run, as reported by the trigger response
    pub trigger_url: String,
    pub triggered_at: DateTime<Utc>,
}

/// One observation of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub id: i64,
    pub status_code: i64,
    /// `None` when the remote reported a code outside the known table
    pub status: Option<RunStatus>,
    pub status_humanized: Option<String>,
    pub git_sha: Option<String>,
    /// Only populated when steps were requested
    pub steps: Vec<StepLog>,
}

impl RunState {
    pub fn is_complete(&self) -> bool {
        self.status.is_some_and(RunStatus::is_complete)
    }

    pub fn is_error(&self) -> bool {
        self.status.is_some_and(RunStatus::is_error)
    }

    /// Human readable status, preferring the remote's own wording
    pub fn status_text(&self) -> String {
        match (&self.status_humanized, self.status) {
            (Some(text), _) if !text.is_empty() => text.clone(),
            (_, Some(status)) => status.to_string(),
            _ => format!("Unknown ({})", self.status_code),
        }
    }
}

/// Log output of a single run step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLog {
    pub name: String,
    pub log_text: String,
}

/// A named document produced by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub content: Vec<u8>,
}
