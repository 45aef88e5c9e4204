//! The remote API seam
//!
//! [`CloudApi`] describes single attempts against dbt Cloud. Retries are
//! layered on top by [`crate::RemoteClient`], which lets tests substitute an
//! in-memory implementation.

use async_trait::async_trait;
use dbtc_core::domain::request::RunRequest;
use dbtc_core::dto::run::{RunDetail, TriggeredRun};

use crate::error::Result;

/// One-shot calls against the dbt Cloud v2 API
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Triggers a run of `job_id`
    async fn trigger_run(
        &self,
        account_id: &str,
        job_id: &str,
        request: &RunRequest,
    ) -> Result<TriggeredRun>;

    /// Fetches the current detail of a run, optionally with its steps
    async fn get_run(&self, account_id: &str, run_id: i64, include_steps: bool)
    -> Result<RunDetail>;

    /// Downloads a run artifact as raw bytes
    async fn get_artifact(&self, account_id: &str, run_id: i64, name: &str) -> Result<Vec<u8>>;
}
