//! dbt Cloud HTTP Client
//!
//! A small, type-safe client for the parts of the dbt Cloud v2 API needed to
//! trigger a job, watch the resulting run and collect its artifacts.
//!
//! Two layers are exposed:
//! - [`DbtCloudClient`]: one HTTP attempt per call, implementing [`CloudApi`]
//! - [`RemoteClient`]: the retrying facade the runner talks to
//!
//! # Example
//!
//! ```no_run
//! use dbtc_client::{ClientConfig, RemoteClient};
//! use dbtc_core::domain::request::{RawOverrides, RunRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://cloud.getdbt.com", "token");
//!     let client = RemoteClient::from_config(&config)?;
//!
//!     let request = RunRequest::compose("Triggered from CI", &RawOverrides::new())?;
//!     let handle = client.trigger("1234", "5678", &request).await?;
//!
//!     println!("Triggered run {}", handle.run_id);
//!     Ok(())
//! }
//! ```

mod api;
mod artifacts;
pub mod error;
mod retry;
mod runs;

// Re-export commonly used types
pub use api::CloudApi;
pub use error::{ClientError, Result};
pub use retry::{FetchOutcome, RemoteClient, RetryPolicy};

use async_trait::async_trait;
use dbtc_core::domain::request::RunRequest;
use dbtc_core::dto::run::{RunDetail, TriggeredRun};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default per-call timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for dbt Cloud
///
/// Built once per invocation and handed to the client constructor.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the dbt Cloud instance (e.g., "https://cloud.getdbt.com")
    pub base_url: String,
    /// API token sent as a bearer credential
    pub token: String,
    /// Upper bound for each individual HTTP attempt
    pub request_timeout: Duration,
    /// Retry policy applied to every call
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// HTTP client for the dbt Cloud v2 API
#[derive(Debug, Clone)]
pub struct DbtCloudClient {
    /// API root, always ending in `/api/v2`
    api_url: String,
    /// HTTP client instance, carrying auth headers and timeout
    client: Client,
}

impl DbtCloudClient {
    /// Create a new client from connection settings
    ///
    /// # Example
    /// ```
    /// use dbtc_client::{ClientConfig, DbtCloudClient};
    ///
    /// let client = DbtCloudClient::new(&ClientConfig::new("https://cloud.getdbt.com/", "token")).unwrap();
    /// assert_eq!(client.api_url(), "https://cloud.getdbt.com/api/v2");
    /// ```
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| ClientError::InvalidConfig("token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self::with_client(&config.base_url, client))
    }

    /// Create a client around a preconfigured reqwest Client
    ///
    /// The caller is responsible for authentication headers.
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            api_url: api_root(base_url),
            client,
        }
    }

    /// Get the API root URL
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize a JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;

        Ok(response.json().await?)
    }

    /// Check the status code and return the raw body
    async fn handle_bytes(&self, response: reqwest::Response) -> Result<Vec<u8>> {
        let response = self.check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl CloudApi for DbtCloudClient {
    async fn trigger_run(
        &self,
        account_id: &str,
        job_id: &str,
        request: &RunRequest,
    ) -> Result<TriggeredRun> {
        self.trigger_job_run(account_id, job_id, request).await
    }

    async fn get_run(
        &self,
        account_id: &str,
        run_id: i64,
        include_steps: bool,
    ) -> Result<RunDetail> {
        self.get_run_detail(account_id, run_id, include_steps).await
    }

    async fn get_artifact(&self, account_id: &str, run_id: i64, name: &str) -> Result<Vec<u8>> {
        self.download_artifact(account_id, run_id, name).await
    }
}

fn api_root(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/api/v2") {
        base.to_string()
    } else {
        format!("{}/api/v2", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned response per connection, then holds the socket open
    async fn serve(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                });
            }
        });

        format!("http://{}", addr)
    }

    fn local_client(base_url: &str) -> DbtCloudClient {
        let mut config = ClientConfig::new(base_url, "t");
        config.request_timeout = Duration::from_millis(300);
        DbtCloudClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_stalled_body_is_a_timeout() {
        let url = serve(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"data\": {",
        )
        .await;
        let client = local_client(&url);

        let err = client.get_run_detail("1", 2, false).await.unwrap_err();
        assert!(err.is_timeout(), "{err:?}");
        assert!(err.is_transient());

        let err = client.download_artifact("1", 2, "run_results.json").await.unwrap_err();
        assert!(err.is_timeout(), "{err:?}");
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_parse_error() {
        let url = serve(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 9\r\n\r\nnot json!",
        )
        .await;

        let err = local_client(&url).get_run_detail("1", 2, false).await.unwrap_err();
        assert!(matches!(err, ClientError::ParseError(_)), "{err:?}");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_client_creation() {
        let client = DbtCloudClient::new(&ClientConfig::new("https://cloud.getdbt.com", "t")).unwrap();
        assert_eq!(client.api_url(), "https://cloud.getdbt.com/api/v2");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = DbtCloudClient::with_client("https://emea.dbt.com/", Client::new());
        assert_eq!(client.api_url(), "https://emea.dbt.com/api/v2");
    }

    #[test]
    fn test_client_keeps_explicit_api_root() {
        let client = DbtCloudClient::with_client("https://cloud.getdbt.com/api/v2/", Client::new());
        assert_eq!(client.api_url(), "https://cloud.getdbt.com/api/v2");
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let err = DbtCloudClient::new(&ClientConfig::new("https://cloud.getdbt.com", "bad\ntoken"))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new("https://cloud.getdbt.com", "t");
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.retry, RetryPolicy::default());
    }
}
