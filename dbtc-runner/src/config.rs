//! Runner configuration
//!
//! Inputs arrive as command-line flags or, when run as a GitHub Action, as
//! `INPUT_*` environment variables. They are collected into a [`Config`]
//! which is validated before any request is made.

use clap::{ArgAction, Parser};
use dbtc_client::{ClientConfig, RetryPolicy};
use dbtc_core::domain::request::{OverrideKey, RawOverrides};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://cloud.getdbt.com";
pub const RUN_RESULTS: &str = "run_results.json";
pub const MANIFEST: &str = "manifest.json";

#[derive(Parser, Debug)]
#[command(name = "dbtc")]
#[command(about = "Trigger a dbt Cloud job and wait for it to finish", long_about = None)]
pub struct Cli {
    /// dbt Cloud base URL
    #[arg(long, env = "INPUT_DBT_CLOUD_URL", default_value = DEFAULT_BASE_URL)]
    pub dbt_cloud_url: String,

    /// dbt Cloud account id
    #[arg(long, env = "INPUT_DBT_CLOUD_ACCOUNT_ID")]
    pub dbt_cloud_account_id: String,

    /// dbt Cloud job id
    #[arg(long, env = "INPUT_DBT_CLOUD_JOB_ID")]
    pub dbt_cloud_job_id: String,

    /// API token
    #[arg(long, env = "INPUT_DBT_CLOUD_TOKEN", hide_env_values = true)]
    pub dbt_cloud_token: String,

    /// Reason recorded on the triggered run
    #[arg(long, env = "INPUT_CAUSE", default_value = "Triggered by dbtc")]
    pub cause: String,

    /// Seconds between status checks
    #[arg(long, env = "INPUT_INTERVAL", default_value_t = 30)]
    pub interval: u64,

    /// Wait for the run to finish
    #[arg(long, env = "INPUT_WAIT_FOR_JOB", default_value_t = true, action = ArgAction::Set)]
    pub wait_for_job: bool,

    /// Exit non-zero when the run ends in error or is cancelled
    #[arg(long, env = "INPUT_FAILURE_ON_ERROR", default_value_t = true, action = ArgAction::Set)]
    pub failure_on_error: bool,

    /// Download run artifacts after completion
    #[arg(long, env = "INPUT_GET_ARTIFACTS", default_value_t = true, action = ArgAction::Set)]
    pub get_artifacts: bool,

    /// Also download manifest.json
    #[arg(long, env = "INPUT_FETCH_MANIFEST", default_value_t = false, action = ArgAction::Set)]
    pub fetch_manifest: bool,

    /// Directory artifacts are written to
    #[arg(long, env = "INPUT_OUTPUT_DIR", default_value = "./target")]
    pub output_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, env = "INPUT_REQUEST_TIMEOUT", default_value_t = 5)]
    pub request_timeout: u64,

    /// Seconds to wait before fetching step logs of a failed run
    #[arg(long, env = "INPUT_SETTLE_DELAY", default_value_t = 5)]
    pub settle_delay: u64,

    /// Give up polling after this many seconds (unbounded when unset)
    #[arg(long, env = "INPUT_MAX_WAIT")]
    pub max_wait: Option<u64>,

    #[arg(long, env = "INPUT_GIT_SHA")]
    pub git_sha: Option<String>,
    #[arg(long, env = "INPUT_GIT_BRANCH")]
    pub git_branch: Option<String>,
    #[arg(long, env = "INPUT_SCHEMA_OVERRIDE")]
    pub schema_override: Option<String>,
    #[arg(long, env = "INPUT_DBT_VERSION_OVERRIDE")]
    pub dbt_version_override: Option<String>,
    #[arg(long, env = "INPUT_THREADS_OVERRIDE")]
    pub threads_override: Option<String>,
    #[arg(long, env = "INPUT_TARGET_NAME_OVERRIDE")]
    pub target_name_override: Option<String>,
    #[arg(long, env = "INPUT_GENERATE_DOCS_OVERRIDE")]
    pub generate_docs_override: Option<String>,
    #[arg(long, env = "INPUT_TIMEOUT_SECONDS_OVERRIDE")]
    pub timeout_seconds_override: Option<String>,
    /// A single step, a JSON list or a YAML list of steps
    #[arg(long, env = "INPUT_STEPS_OVERRIDE")]
    pub steps_override: Option<String>,
}

impl Cli {
    /// Collects the override flags that were supplied, keyed by field name
    ///
    /// Values are kept raw; typing happens when the request is composed.
    fn raw_overrides(&self) -> RawOverrides {
        let values = [
            (OverrideKey::GitSha, &self.git_sha),
            (OverrideKey::GitBranch, &self.git_branch),
            (OverrideKey::SchemaOverride, &self.schema_override),
            (OverrideKey::DbtVersionOverride, &self.dbt_version_override),
            (OverrideKey::ThreadsOverride, &self.threads_override),
            (OverrideKey::TargetNameOverride, &self.target_name_override),
            (OverrideKey::GenerateDocsOverride, &self.generate_docs_override),
            (OverrideKey::TimeoutSecondsOverride, &self.timeout_seconds_override),
            (OverrideKey::StepsOverride, &self.steps_override),
        ];

        values
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.as_str().to_string(), v.clone())))
            .collect()
    }
}

/// Runner configuration
#[derive(Clone)]
pub struct Config {
    /// dbt Cloud base URL (e.g., "https://cloud.getdbt.com")
    pub base_url: String,
    pub account_id: String,
    pub job_id: String,
    pub token: String,

    /// Reason recorded on the run
    pub cause: String,
    /// Raw override inputs, typed when the request is composed
    pub overrides: RawOverrides,

    /// How long to sleep between status checks
    pub poll_interval: Duration,
    /// Upper bound for each HTTP attempt
    pub request_timeout: Duration,
    /// Wait before fetching step logs of a failed run
    pub settle_delay: Duration,
    /// Optional bound on total polling time
    pub max_wait: Option<Duration>,
    pub retry: RetryPolicy,

    pub wait_for_job: bool,
    pub failure_on_error: bool,
    pub get_artifacts: bool,
    /// Artifacts to download, in order
    pub artifact_names: Vec<String>,
    pub output_dir: PathBuf,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(account_id: String, job_id: String, token: String) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            account_id,
            job_id,
            token,
            cause: "Triggered by dbtc".to_string(),
            overrides: RawOverrides::new(),
            poll_interval: Duration::from_secs(30),
            request_timeout: dbtc_client::DEFAULT_REQUEST_TIMEOUT,
            settle_delay: Duration::from_secs(5),
            max_wait: None,
            retry: RetryPolicy::default(),
            wait_for_job: true,
            failure_on_error: true,
            get_artifacts: true,
            artifact_names: vec![RUN_RESULTS.to_string()],
            output_dir: PathBuf::from("./target"),
        }
    }

    pub fn from_cli(cli: Cli) -> Self {
        let overrides = cli.raw_overrides();

        let mut artifact_names = vec![RUN_RESULTS.to_string()];
        if cli.fetch_manifest {
            artifact_names.push(MANIFEST.to_string());
        }

        Self {
            base_url: cli.dbt_cloud_url,
            cause: cli.cause,
            overrides,
            poll_interval: Duration::from_secs(cli.interval),
            request_timeout: Duration::from_secs(cli.request_timeout),
            settle_delay: Duration::from_secs(cli.settle_delay),
            max_wait: cli.max_wait.map(Duration::from_secs),
            wait_for_job: cli.wait_for_job,
            failure_on_error: cli.failure_on_error,
            get_artifacts: cli.get_artifacts,
            artifact_names,
            output_dir: cli.output_dir,
            ..Self::new(cli.dbt_cloud_account_id, cli.dbt_cloud_job_id, cli.dbt_cloud_token)
        }
    }

    /// Connection settings for the dbt Cloud client
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            request_timeout: self.request_timeout,
            retry: self.retry,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.account_id.trim().is_empty() {
            anyhow::bail!("dbt_cloud_account_id cannot be empty");
        }

        if self.job_id.trim().is_empty() {
            anyhow::bail!("dbt_cloud_job_id cannot be empty");
        }

        if self.token.trim().is_empty() {
            anyhow::bail!("dbt_cloud_token cannot be empty");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("dbt_cloud_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("interval must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.max_wait.is_some_and(|d| d.is_zero()) {
            anyhow::bail!("max_wait must be greater than 0 when set");
        }

        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("job_id", &self.job_id)
            .field("token", &"<redacted>")
            .field("cause", &self.cause)
            .field("overrides", &self.overrides)
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout", &self.request_timeout)
            .field("settle_delay", &self.settle_delay)
            .field("max_wait", &self.max_wait)
            .field("wait_for_job", &self.wait_for_job)
            .field("failure_on_error", &self.failure_on_error)
            .field("get_artifacts", &self.get_artifacts)
            .field("artifact_names", &self.artifact_names)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new("1234".to_string(), "5678".to_string(), "secret".to_string())
    }

    #[test]
    fn test_default_config() {
        let config = config();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.settle_delay, Duration::from_secs(5));
        assert_eq!(config.max_wait, None);
        assert_eq!(config.artifact_names, vec![RUN_RESULTS.to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = config();

        config.account_id = String::new();
        assert!(config.validate().is_err());
        config.account_id = "1234".to_string();

        config.base_url = "cloud.getdbt.com".to_string();
        assert!(config.validate().is_err());
        config.base_url = DEFAULT_BASE_URL.to_string();

        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.poll_interval = Duration::from_secs(10);

        config.max_wait = Some(Duration::ZERO);
        assert!(config.validate().is_err());
        config.max_wait = Some(Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_from_cli() {
        let cli = Cli::try_parse_from([
            "dbtc",
            "--dbt-cloud-account-id",
            "1",
            "--dbt-cloud-job-id",
            "2",
            "--dbt-cloud-token",
            "t",
            "--interval",
            "10",
            "--wait-for-job",
            "false",
            "--fetch-manifest",
            "true",
            "--max-wait",
            "600",
            "--threads-override",
            "4",
            "--steps-override",
            "dbt build",
        ])
        .unwrap();
        let config = Config::from_cli(cli);

        assert_eq!(config.account_id, "1");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert!(!config.wait_for_job);
        assert!(config.failure_on_error);
        assert_eq!(config.max_wait, Some(Duration::from_secs(600)));
        assert_eq!(
            config.artifact_names,
            vec![RUN_RESULTS.to_string(), MANIFEST.to_string()]
        );
        assert_eq!(config.overrides.len(), 2);
        assert_eq!(config.overrides["threads_override"], "4");
        assert_eq!(config.overrides["steps_override"], "dbt build");
    }
}
