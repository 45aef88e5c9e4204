//! Runner error types

use dbtc_client::ClientError;
use dbtc_core::ConfigError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Reasons an orchestrated run can fail
#[derive(Debug, Error)]
pub enum RunError {
    /// An override could not be decoded; nothing was sent
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to trigger job: {0}")]
    Trigger(#[source] ClientError),

    #[error("failed to fetch artifact `{name}`: {source}")]
    Artifact {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run itself finished in error or was cancelled
    ///
    /// `logs` holds the rendered step logs, which are printed as they are
    /// fetched and kept out of the message.
    #[error("run {run_id} finished with '{status}'")]
    RemoteJob {
        run_id: i64,
        status: String,
        git_sha: Option<String>,
        logs: Option<String>,
    },

    /// The optional polling bound was exceeded before the run finished
    #[error("run {run_id} did not finish within {waited:?}")]
    PollTimeout { run_id: i64, waited: Duration },
}

pub type Result<T> = std::result::Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_job_message_is_a_summary() {
        let err = RunError::RemoteJob {
            run_id: 7,
            status: "Error".to_string(),
            git_sha: None,
            logs: Some("Step: dbt run\nboom".to_string()),
        };
        assert_eq!(err.to_string(), "run 7 finished with 'Error'");
    }

    #[test]
    fn test_poll_timeout_is_distinct() {
        let err = RunError::PollTimeout {
            run_id: 7,
            waited: Duration::from_secs(60),
        };
        assert!(!matches!(err, RunError::RemoteJob { .. }));
        assert!(err.to_string().contains("did not finish"));
    }
}
