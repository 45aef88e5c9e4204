//! Run-related API endpoints

use crate::DbtCloudClient;
use crate::error::Result;
use dbtc_core::domain::request::RunRequest;
use dbtc_core::dto::run::{Envelope, RunDetail, TriggeredRun};
use tracing::debug;

impl DbtCloudClient {
    // =============================================================================
    // Run Lifecycle
    // =============================================================================

    /// Trigger a new run of a job
    ///
    /// # Arguments
    /// * `account_id` - The dbt Cloud account
    /// * `job_id` - The job to run
    /// * `request` - Cause and overrides for this run
    ///
    /// # Returns
    /// The id and browser URL of the new run
    pub async fn trigger_job_run(
        &self,
        account_id: &str,
        job_id: &str,
        request: &RunRequest,
    ) -> Result<TriggeredRun> {
        let url = format!("{}/accounts/{}/jobs/{}/run/", self.api_url, account_id, job_id);
        debug!(url = %url, "POST trigger run");
        let response = self.client.post(&url).json(request).send().await?;

        let envelope: Envelope<TriggeredRun> = self.handle_response(response).await?;
        Ok(envelope.data)
    }

    /// Get the current detail of a run
    ///
    /// # Arguments
    /// * `account_id` - The dbt Cloud account
    /// * `run_id` - The run to look up
    /// * `include_steps` - Also return the run steps and their logs
    pub async fn get_run_detail(
        &self,
        account_id: &str,
        run_id: i64,
        include_steps: bool,
    ) -> Result<RunDetail> {
        let url = format!("{}/accounts/{}/runs/{}/", self.api_url, account_id, run_id);
        debug!(url = %url, include_steps, "GET run");

        let mut request = self.client.get(&url);
        if include_steps {
            request = request.query(&[("include_related", r#"["run_steps"]"#)]);
        }
        let response = request.send().await?;

        let envelope: Envelope<RunDetail> = self.handle_response(response).await?;
        Ok(envelope.data)
    }
}
