//! In-memory dbt Cloud used by the runner tests

use async_trait::async_trait;
use dbtc_client::{ClientError, CloudApi, RemoteClient, RetryPolicy};
use dbtc_core::domain::request::RunRequest;
use dbtc_core::dto::run::{RunDetail, RunStepDetail, TriggeredRun};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays scripted run responses in order
///
/// Once the script runs out the last response is repeated, so a terminal
/// state stays terminal.
#[derive(Default)]
pub struct ScriptedApi {
    runs: Mutex<VecDeque<Result<RunDetail, ClientError>>>,
    last_run: Mutex<Option<RunDetail>>,
    step_detail: Mutex<Option<Result<RunDetail, ClientError>>>,
    trigger_fails: Mutex<bool>,
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
    pub triggered: Mutex<Vec<RunRequest>>,
    pub run_fetches: Mutex<Vec<bool>>,
    pub artifact_fetches: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_run(&self, detail: Result<RunDetail, ClientError>) {
        self.runs.lock().unwrap().push_back(detail);
    }

    /// Response for fetches that ask for step logs
    pub fn set_step_detail(&self, detail: Result<RunDetail, ClientError>) {
        *self.step_detail.lock().unwrap() = Some(detail);
    }

    /// Makes every trigger attempt fail with a transport error
    pub fn fail_triggers(&self) {
        *self.trigger_fails.lock().unwrap() = true;
    }

    pub fn add_artifact(&self, name: &str, body: &[u8]) {
        self.artifacts
            .lock()
            .unwrap()
            .insert(name.to_string(), body.to_vec());
    }

    pub fn client(self: &Arc<Self>) -> RemoteClient {
        RemoteClient::new(
            self.clone(),
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::ZERO,
            },
        )
    }

    pub fn run_fetch_count(&self) -> usize {
        self.run_fetches.lock().unwrap().len()
    }
}

#[async_trait]
impl CloudApi for ScriptedApi {
    async fn trigger_run(
        &self,
        _account_id: &str,
        _job_id: &str,
        request: &RunRequest,
    ) -> Result<TriggeredRun, ClientError> {
        self.triggered.lock().unwrap().push(request.clone());
        if *self.trigger_fails.lock().unwrap() {
            return Err(transport_error());
        }
        Ok(TriggeredRun {
            id: 555,
            href: "https://cloud.getdbt.com/#/accounts/1/runs/555/".to_string(),
        })
    }

    async fn get_run(
        &self,
        _account_id: &str,
        _run_id: i64,
        include_steps: bool,
    ) -> Result<RunDetail, ClientError> {
        self.run_fetches.lock().unwrap().push(include_steps);

        if include_steps {
            if let Some(detail) = self.step_detail.lock().unwrap().take() {
                return detail;
            }
        }

        match self.runs.lock().unwrap().pop_front() {
            Some(Ok(detail)) => {
                *self.last_run.lock().unwrap() = Some(detail.clone());
                Ok(detail)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last_run
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ClientError::Transport("no scripted response".to_string())),
        }
    }

    async fn get_artifact(
        &self,
        _account_id: &str,
        _run_id: i64,
        name: &str,
    ) -> Result<Vec<u8>, ClientError> {
        self.artifact_fetches.lock().unwrap().push(name.to_string());
        self.artifacts
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::api_error(404, format!("{} not found", name)))
    }
}

pub fn run(status: i64) -> RunDetail {
    RunDetail {
        id: 555,
        status,
        status_humanized: None,
        git_sha: None,
        run_steps: None,
    }
}

pub fn run_with_sha(status: i64, sha: &str) -> RunDetail {
    RunDetail {
        git_sha: Some(sha.to_string()),
        ..run(status)
    }
}

pub fn run_with_steps(status: i64, steps: &[(&str, &str)]) -> RunDetail {
    RunDetail {
        run_steps: Some(
            steps
                .iter()
                .map(|(name, logs)| RunStepDetail {
                    name: name.to_string(),
                    logs: Some(logs.to_string()),
                })
                .collect(),
        ),
        ..run(status)
    }
}

pub fn transport_error() -> ClientError {
    ClientError::Transport("connection refused".to_string())
}
