//! Artifact download endpoint

use crate::DbtCloudClient;
use crate::error::Result;
use tracing::debug;

impl DbtCloudClient {
    /// Download a run artifact
    ///
    /// The body is returned untouched so it can be written out verbatim.
    ///
    /// # Arguments
    /// * `account_id` - The dbt Cloud account
    /// * `run_id` - The run that produced the artifact
    /// * `name` - Artifact path, e.g. `run_results.json`
    pub async fn download_artifact(
        &self,
        account_id: &str,
        run_id: i64,
        name: &str,
    ) -> Result<Vec<u8>> {
        let url = format!(
            "{}/accounts/{}/runs/{}/artifacts/{}",
            self.api_url, account_id, run_id, name
        );
        debug!(url = %url, "GET artifact");
        let response = self.client.get(&url).send().await?;

        self.handle_bytes(response).await
    }
}
