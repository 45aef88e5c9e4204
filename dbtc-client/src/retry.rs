//! Retrying facade over [`CloudApi`]
//!
//! Every call goes through the same policy: a bounded number of attempts
//! with a linearly growing delay, retrying only transport failures.

use chrono::Utc;
use dbtc_core::domain::request::RunRequest;
use dbtc_core::domain::run::{Artifact, RunHandle, RunState};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::CloudApi;
use crate::error::{ClientError, Result};
use crate::{ClientConfig, DbtCloudClient};

/// Attempt budget and backoff for remote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// The n-th retry waits `n * base_delay`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded after {} attempt(s)", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        operation, attempt, max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Result of looking up a run
///
/// `Unavailable` is not fatal: the poller treats it as "try again next
/// interval".
#[derive(Debug)]
pub enum FetchOutcome {
    Ready(RunState),
    Unavailable(ClientError),
}

impl FetchOutcome {
    pub fn into_state(self) -> Option<RunState> {
        match self {
            Self::Ready(state) => Some(state),
            Self::Unavailable(_) => None,
        }
    }
}

/// Retrying client used by the runner
#[derive(Clone)]
pub struct RemoteClient {
    api: Arc<dyn CloudApi>,
    retry: RetryPolicy,
}

impl RemoteClient {
    pub fn new(api: Arc<dyn CloudApi>, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// Builds the HTTP client described by `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api = DbtCloudClient::new(config)?;
        Ok(Self::new(Arc::new(api), config.retry))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Triggers a run; exhausting retries is fatal
    pub async fn trigger(
        &self,
        account_id: &str,
        job_id: &str,
        request: &RunRequest,
    ) -> Result<RunHandle> {
        let run = self
            .retry
            .execute("trigger run", || self.api.trigger_run(account_id, job_id, request))
            .await?;

        Ok(RunHandle {
            account_id: account_id.to_string(),
            job_id: job_id.to_string(),
            run_id: run.id,
            trigger_url: run.href,
            triggered_at: Utc::now(),
        })
    }

    /// Looks up a run, folding every failure into [`FetchOutcome::Unavailable`]
    pub async fn fetch_run(&self, account_id: &str, run_id: i64, include_steps: bool) -> FetchOutcome {
        let result = self
            .retry
            .execute("fetch run", || self.api.get_run(account_id, run_id, include_steps))
            .await;

        match result {
            Ok(detail) => FetchOutcome::Ready(detail.into_state()),
            Err(e) => {
                warn!("Could not fetch run {}: {}", run_id, e);
                FetchOutcome::Unavailable(e)
            }
        }
    }

    /// Downloads an artifact; exhausting retries is fatal
    pub async fn fetch_artifact(&self, account_id: &str, run_id: i64, name: &str) -> Result<Artifact> {
        let content = self
            .retry
            .execute("fetch artifact", || self.api.get_artifact(account_id, run_id, name))
            .await?;

        Ok(Artifact {
            name: name.to_string(),
            content,
        })
    }
}
