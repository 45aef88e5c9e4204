//! Run poller
//!
//! Triggers a run and watches it until it reaches a terminal state. Every
//! status check is a fresh snapshot; failed lookups are retried on the next
//! interval rather than ending the loop.

use dbtc_client::{FetchOutcome, RemoteClient};
use dbtc_core::domain::request::RunRequest;
use dbtc_core::domain::run::{RunHandle, RunState};
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{Result, RunError};

/// Where the poller is in a run's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Triggered,
    Polling,
    Completed,
}

/// Poll loop tuning
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    /// Stop with [`RunError::PollTimeout`] once exceeded; unbounded if `None`
    pub max_wait: Option<Duration>,
    /// When false, check once and return without waiting for completion
    pub wait_for_completion: bool,
}

/// What the poller observed
#[derive(Debug)]
pub enum PollResult {
    /// The run reached Success, Error or Cancelled
    Completed { handle: RunHandle, state: RunState },
    /// Returned early without waiting; the run may still be in flight
    Detached {
        handle: RunHandle,
        state: Option<RunState>,
    },
}

/// Drives a single run from trigger to completion
pub struct RunPoller<'a> {
    client: &'a RemoteClient,
    settings: PollSettings,
    state: PollerState,
}

impl<'a> RunPoller<'a> {
    /// Creates a new run poller
    pub fn new(client: &'a RemoteClient, settings: PollSettings) -> Self {
        Self {
            client,
            settings,
            state: PollerState::Idle,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Triggers `job_id` and polls the resulting run
    pub async fn run(
        &mut self,
        account_id: &str,
        job_id: &str,
        request: &RunRequest,
    ) -> Result<PollResult> {
        let handle = self
            .client
            .trigger(account_id, job_id, request)
            .await
            .map_err(RunError::Trigger)?;
        self.transition(PollerState::Triggered);

        info!("Triggered job. {}", handle.trigger_url);
        info!("Run id: {}", handle.run_id);

        self.transition(PollerState::Polling);

        if !self.settings.wait_for_completion {
            return Ok(self.check_once(handle).await);
        }

        let state = self.poll_until_complete(&handle).await?;
        self.transition(PollerState::Completed);

        Ok(PollResult::Completed { handle, state })
    }

    fn transition(&mut self, next: PollerState) {
        debug!("Poller {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    async fn check_once(&mut self, handle: RunHandle) -> PollResult {
        let state = self
            .client
            .fetch_run(&handle.account_id, handle.run_id, false)
            .await
            .into_state();

        match &state {
            Some(state) => info!("Run {} - {}", state.id, state.status_text()),
            None => warn!("Status of run {} is not available yet", handle.run_id),
        }
        warn!("Not waiting for the run to finish; step logs will not be available");

        if state.as_ref().is_some_and(RunState::is_complete) {
            self.transition(PollerState::Completed);
        }

        PollResult::Detached { handle, state }
    }

    async fn poll_until_complete(&self, handle: &RunHandle) -> Result<RunState> {
        info!(
            "Polling run {} every {:?}",
            handle.run_id, self.settings.interval
        );

        let started = Instant::now();

        loop {
            time::sleep(self.settings.interval).await;

            match self
                .client
                .fetch_run(&handle.account_id, handle.run_id, false)
                .await
            {
                FetchOutcome::Unavailable(e) => {
                    warn!(
                        "No result for run {} ({}), checking again in {:?}",
                        handle.run_id, e, self.settings.interval
                    );
                }
                FetchOutcome::Ready(state) => {
                    match state.status {
                        Some(status) => info!("Run {} - {}", state.id, status),
                        None => warn!(
                            "Run {} reported unknown status code {}, continuing to poll",
                            state.id, state.status_code
                        ),
                    }

                    if state.is_complete() {
                        info!("Run {} finished with '{}'", state.id, state.status_text());
                        return Ok(state);
                    }
                }
            }

            if let Some(max_wait) = self.settings.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    return Err(RunError::PollTimeout {
                        run_id: handle.run_id,
                        waited,
                    });
                }
                debug!("Waited {:?} of {:?}", waited, max_wait);
            }
        }
    }
}
