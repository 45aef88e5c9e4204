//! Run DTOs for the dbt Cloud v2 API

use serde::{Deserialize, Serialize};

use crate::domain::run::{RunState, StepLog};
use crate::domain::status::RunStatus;

/// Every v2 response wraps its payload in a `data` field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Payload returned by the job trigger endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggeredRun {
    pub id: i64,
    #[serde(default)]
    pub href: String,
}

/// Payload returned by the run detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDetail {
    pub id: i64,
    pub status: i64,
    #[serde(default)]
    pub status_humanized: Option<String>,
    #[serde(default)]
    pub git_sha: Option<String>,
    #[serde(default)]
    pub run_steps: Option<Vec<RunStepDetail>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStepDetail {
    pub name: String,
    #[serde(default)]
    pub logs: Option<String>,
}

impl RunDetail {
    /// Converts the wire shape into a domain snapshot
    ///
    /// Unknown status codes yield a snapshot with no semantic status, which
    /// is never complete.
    pub fn into_state(self) -> RunState {
        RunState {
            id: self.id,
            status_code: self.status,
            status: RunStatus::interpret(self.status).ok(),
            status_humanized: self.status_humanized,
            git_sha: self.git_sha.filter(|sha| !sha.is_empty()),
            steps: self
                .run_steps
                .unwrap_or_default()
                .into_iter()
                .map(|step| StepLog {
                    name: step.name,
                    log_text: step.logs.unwrap_or_default(),
                })
                .collect(),
        }
    }
}
