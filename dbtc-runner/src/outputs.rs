//! CI outputs
//!
//! Exposes the run id and commit of a run to the invoking workflow. Under
//! GitHub Actions outputs are appended to the file named by `GITHUB_OUTPUT`;
//! elsewhere they are only logged.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

use crate::error::RunError;

pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Named values handed back to the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub run_id: i64,
    pub git_sha: Option<String>,
}

impl Outputs {
    /// Outputs for a failure that happened after the run was created
    pub fn for_failure(err: &RunError) -> Option<Self> {
        match err {
            RunError::RemoteJob {
                run_id, git_sha, ..
            } => Some(Self {
                run_id: *run_id,
                git_sha: git_sha.clone(),
            }),
            RunError::PollTimeout { run_id, .. } => Some(Self {
                run_id: *run_id,
                git_sha: None,
            }),
            _ => None,
        }
    }

    fn lines(&self) -> String {
        format!(
            "git_sha={}\nrun_id={}\n",
            self.git_sha.as_deref().unwrap_or_default(),
            self.run_id
        )
    }

    /// Writes the outputs wherever the environment expects them
    pub fn emit(&self) -> io::Result<()> {
        match std::env::var_os(GITHUB_OUTPUT_ENV) {
            Some(path) if !path.is_empty() => self.append_to(Path::new(&path)),
            _ => {
                info!(
                    "Outputs: run_id={} git_sha={}",
                    self.run_id,
                    self.git_sha.as_deref().unwrap_or("<none>")
                );
                Ok(())
            }
        }
    }

    pub fn append_to(&self, path: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(self.lines().as_bytes())
    }
}
