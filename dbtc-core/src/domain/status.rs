//! Run status interpretation
//!
//! dbt Cloud reports run status as a bare integer. This module maps those
//! codes onto a closed set of lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::UnknownStatusError;

/// Lifecycle state of a remote run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    Queued,
    Starting,
    Running,
    Success,
    Error,
    Cancelled,
}

/// Status code table, in lifecycle order
const STATUS_TABLE: [(i64, RunStatus); 6] = [
    (1, RunStatus::Queued),
    (2, RunStatus::Starting),
    (3, RunStatus::Running),
    (10, RunStatus::Success),
    (20, RunStatus::Error),
    (30, RunStatus::Cancelled),
];

impl RunStatus {
    /// Interprets a numeric status code
    ///
    /// Unknown codes are reported as an error so the caller can log the raw
    /// value; they are never mapped onto a terminal state.
    pub fn interpret(code: i64) -> Result<Self, UnknownStatusError> {
        STATUS_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, status)| *status)
            .ok_or(UnknownStatusError(code))
    }

    /// The numeric code dbt Cloud uses for this state
    pub fn code(self) -> i64 {
        STATUS_TABLE
            .iter()
            .find(|(_, status)| *status == self)
            .map(|(c, _)| *c)
            .unwrap_or_default()
    }

    /// Whether the run will never transition again
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Cancelled)
    }

    /// Whether the run ended without succeeding
    ///
    /// A cancelled run counts as an error outcome.
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Cancelled)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Queued => "Queued",
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::Success => "Success",
            Self::Error => "Error",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

impl TryFrom<i64> for RunStatus {
    type Error = UnknownStatusError;

    fn try_from(code: i64) -> Result<Self, UnknownStatusError> {
        Self::interpret(code)
    }
}
