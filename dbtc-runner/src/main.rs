//! dbtc Runner
//!
//! Triggers a dbt Cloud job from CI and follows the resulting run.
//!
//! Architecture:
//! - Configuration: CLI flags or GitHub Action `INPUT_*` variables
//! - Scheduler: trigger and poll the run to a terminal state
//! - Services: step log reporting and artifact download
//! - Orchestrator: sequences the above and applies the failure policy
//!
//! The process exits non-zero when the tooling fails, or when the run ends
//! in error while `failure_on_error` is set.

mod config;
mod error;
mod orchestrator;
mod outputs;
mod scheduler;
mod service;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Cli, Config};
use crate::error::RunError;
use crate::orchestrator::Orchestrator;
use crate::outputs::Outputs;
use dbtc_client::RemoteClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbtc=info,dbtc_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_cli(Cli::parse());
    config.validate().context("Invalid configuration")?;
    info!(
        "Loaded configuration: account_id={}, job_id={}, url={}",
        config.account_id, config.job_id, config.base_url
    );

    let client = RemoteClient::from_config(&config.client_config())
        .context("Failed to create dbt Cloud client")?;

    let orchestrator = Orchestrator::new(config, client);

    match orchestrator.run().await {
        Ok(outcome) => {
            if !outcome.completed {
                info!("Run {} is still in progress", outcome.run_id);
            } else if !outcome.job_succeeded() {
                let note = match outcome.step_logs {
                    Some(_) => "",
                    None => " (step logs unavailable)",
                };
                warn!("Run {} did not succeed{}", outcome.run_id, note);
            }

            for path in &outcome.artifacts {
                info!("Artifact available at {}", path.display());
            }

            Outputs {
                run_id: outcome.run_id,
                git_sha: outcome.git_sha,
            }
            .emit()
            .context("Failed to write outputs")?;

            Ok(())
        }
        Err(err) => {
            // A run that exists still has useful outputs
            if let Some(outputs) = Outputs::for_failure(&err) {
                outputs.emit().context("Failed to write outputs")?;
            }
            if let RunError::RemoteJob { logs: None, .. } = &err {
                warn!("Step logs were unavailable for the failed run");
            }

            error!("There has been a problem with running your dbt Cloud job: {}", err);
            Err(err.into())
        }
    }
}
