//! Orchestrator
//!
//! Sequences one invocation: compose the request, trigger and poll the run,
//! report step logs on failure, apply the failure policy and collect
//! artifacts. The caller turns the returned [`RunOutcome`] into process
//! outputs and an exit status.

use chrono::Utc;
use dbtc_client::RemoteClient;
use dbtc_core::domain::request::RunRequest;
use dbtc_core::domain::run::RunState;
use dbtc_core::domain::status::RunStatus;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, RunError};
use crate::scheduler::{PollResult, PollSettings, RunPoller};
use crate::service::{ArtifactFetcher, LogReporter};

/// Final result of an invocation whose tooling succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub run_id: i64,
    pub git_sha: Option<String>,
    /// Last observed status; `None` if it was never available
    pub status: Option<RunStatus>,
    /// Whether a terminal state was observed
    pub completed: bool,
    /// Rendered step logs, only collected for failed runs
    pub step_logs: Option<String>,
    pub artifacts: Vec<PathBuf>,
}

impl RunOutcome {
    /// True only when the run completed successfully
    pub fn job_succeeded(&self) -> bool {
        self.status == Some(RunStatus::Success)
    }
}

pub struct Orchestrator {
    config: Config,
    client: RemoteClient,
}

impl Orchestrator {
    pub fn new(config: Config, client: RemoteClient) -> Self {
        Self { config, client }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let config = &self.config;
        let request = RunRequest::compose(config.cause.clone(), &config.overrides)?;

        if !request.overrides.is_empty() {
            info!("Applying overrides: {:?}", request.overrides);
        }

        let mut poller = RunPoller::new(
            &self.client,
            PollSettings {
                interval: config.poll_interval,
                max_wait: config.max_wait,
                wait_for_completion: config.wait_for_job,
            },
        );

        let result = poller
            .run(&config.account_id, &config.job_id, &request)
            .await?;
        debug!("Poller stopped in state {:?}", poller.state());

        let (handle, state) = match result {
            PollResult::Completed { handle, state } => (handle, state),
            PollResult::Detached { handle, state } => {
                return Ok(RunOutcome {
                    run_id: handle.run_id,
                    git_sha: state.as_ref().and_then(|s| s.git_sha.clone()),
                    status: state.as_ref().and_then(|s| s.status),
                    completed: state.as_ref().is_some_and(RunState::is_complete),
                    step_logs: None,
                    artifacts: Vec::new(),
                });
            }
        };

        let elapsed = Utc::now().signed_duration_since(handle.triggered_at);
        info!(
            "Run {} finished with '{}' after {}s",
            handle.run_id,
            state.status_text(),
            elapsed.num_seconds()
        );

        let mut step_logs = None;
        if state.is_error() {
            step_logs = LogReporter::new(&self.client, config.settle_delay)
                .report(&config.account_id, handle.run_id)
                .await;

            if config.failure_on_error {
                return Err(RunError::RemoteJob {
                    run_id: handle.run_id,
                    status: state.status_text(),
                    git_sha: state.git_sha.clone(),
                    logs: step_logs,
                });
            }

            warn!(
                "Run {} finished with '{}', continuing because failure_on_error is disabled",
                handle.run_id,
                state.status_text()
            );
        }

        let mut artifacts = Vec::new();
        if config.get_artifacts {
            artifacts = ArtifactFetcher::new(&self.client, &config.output_dir)
                .fetch_all(&config.account_id, handle.run_id, &config.artifact_names)
                .await?;
        }

        Ok(RunOutcome {
            run_id: handle.run_id,
            git_sha: state.git_sha,
            status: state.status,
            completed: true,
            step_logs,
            artifacts,
        })
    }
}
