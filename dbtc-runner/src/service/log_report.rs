//! Step log reporting for failed runs
//!
//! dbt Cloud may flip a run to a terminal error before its step logs are
//! populated, so the report waits a settle delay and re-fetches the run
//! with steps included. The report is best-effort: a failed lookup yields
//! no logs, never a new error.

use colored::*;
use dbtc_client::{FetchOutcome, RemoteClient};
use dbtc_core::domain::run::StepLog;
use std::time::Duration;
use tracing::{info, warn};

const DELIMITER_WIDTH: usize = 80;

/// Fetches and renders per-step logs of a failed run
pub struct LogReporter<'a> {
    client: &'a RemoteClient,
    settle_delay: Duration,
}

impl<'a> LogReporter<'a> {
    pub fn new(client: &'a RemoteClient, settle_delay: Duration) -> Self {
        Self {
            client,
            settle_delay,
        }
    }

    /// Prints the step logs of a run and returns them rendered as plain text
    ///
    /// Returns `None` when the run detail could not be fetched.
    pub async fn report(&self, account_id: &str, run_id: i64) -> Option<String> {
        info!(
            "Waiting {:?} before fetching step logs of run {}",
            self.settle_delay, run_id
        );
        tokio::time::sleep(self.settle_delay).await;

        let state = match self.client.fetch_run(account_id, run_id, true).await {
            FetchOutcome::Ready(state) => state,
            FetchOutcome::Unavailable(e) => {
                warn!("Step logs of run {} are unavailable: {}", run_id, e);
                return None;
            }
        };

        if state.steps.is_empty() {
            warn!("Run {} reported no steps", run_id);
        }

        print_steps(&state.steps);
        Some(render(&state.steps))
    }
}

/// Renders each step as a delimited header followed by its full log
pub fn render(steps: &[StepLog]) -> String {
    let delimiter = "─".repeat(DELIMITER_WIDTH);
    let mut out = String::new();

    for step in steps {
        out.push_str(&delimiter);
        out.push('\n');
        out.push_str(&format!("Step: {}\n", step.name));
        out.push_str(&delimiter);
        out.push('\n');
        out.push_str(&step.log_text);
        if !step.log_text.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}

fn print_steps(steps: &[StepLog]) {
    for step in steps {
        println!("{}", "─".repeat(DELIMITER_WIDTH).dimmed());
        println!("{} {}", "Step:".bold(), step.name.cyan());
        println!("{}", "─".repeat(DELIMITER_WIDTH).dimmed());
        println!("{}", step.log_text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedApi, run_with_steps, transport_error};

    #[test]
    fn test_render_separates_steps() {
        let steps = vec![
            StepLog {
                name: "Clone git repository".to_string(),
                log_text: "Cloned".to_string(),
            },
            StepLog {
                name: "Invoke dbt with `dbt run`".to_string(),
                log_text: "Database Error\n".to_string(),
            },
        ];
        let rendered = render(&steps);

        assert_eq!(rendered.matches(&"─".repeat(DELIMITER_WIDTH)).count(), 4);
        let clone = rendered.find("Step: Clone git repository").unwrap();
        let invoke = rendered.find("Step: Invoke dbt with `dbt run`").unwrap();
        assert!(clone < invoke);
        assert!(rendered.contains("Cloned\n"));
        assert!(rendered.ends_with("Database Error\n"));
    }

    #[test]
    fn test_render_no_steps() {
        assert_eq!(render(&[]), "");
    }

    #[tokio::test]
    async fn test_report_fetches_steps() {
        let api = ScriptedApi::new();
        api.set_step_detail(Ok(run_with_steps(20, &[("dbt deps", "ok"), ("dbt run", "boom")])));
        let client = api.client();

        let logs = LogReporter::new(&client, Duration::ZERO)
            .report("1", 555)
            .await
            .unwrap();

        assert!(logs.contains("Step: dbt deps"));
        assert!(logs.contains("boom"));
        assert_eq!(*api.run_fetches.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_report_failure_is_not_an_error() {
        let api = ScriptedApi::new();
        api.set_step_detail(Err(transport_error()));
        let client = api.client();

        let logs = LogReporter::new(&client, Duration::ZERO).report("1", 555).await;

        assert!(logs.is_none());
    }
}
