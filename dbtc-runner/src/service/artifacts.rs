//! Artifact retrieval
//!
//! Downloads a fixed, ordered list of run artifacts and writes them into the
//! output directory. Either every artifact is written or none is: all
//! downloads finish before the first file is touched.

use dbtc_client::RemoteClient;
use dbtc_core::domain::run::Artifact;
use std::path::PathBuf;
use tracing::info;

use crate::error::{Result, RunError};

pub struct ArtifactFetcher<'a> {
    client: &'a RemoteClient,
    output_dir: PathBuf,
}

impl<'a> ArtifactFetcher<'a> {
    pub fn new(client: &'a RemoteClient, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    /// Fetches `names` in order and persists them
    ///
    /// # Returns
    /// The paths written, in the same order as `names`
    pub async fn fetch_all(
        &self,
        account_id: &str,
        run_id: i64,
        names: &[String],
    ) -> Result<Vec<PathBuf>> {
        let mut artifacts = Vec::with_capacity(names.len());

        for name in names {
            info!("Fetching artifact {} of run {}", name, run_id);
            let artifact = self
                .client
                .fetch_artifact(account_id, run_id, name)
                .await
                .map_err(|source| RunError::Artifact {
                    name: name.clone(),
                    source,
                })?;
            artifacts.push(artifact);
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| RunError::Io {
                path: self.output_dir.clone(),
                source,
            })?;

        let mut written = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            written.push(self.persist(artifact).await?);
        }

        Ok(written)
    }

    async fn persist(&self, artifact: &Artifact) -> Result<PathBuf> {
        let path = self.output_dir.join(&artifact.name);

        tokio::fs::write(&path, &artifact.content)
            .await
            .map_err(|source| RunError::Io {
                path: path.clone(),
                source,
            })?;

        info!("Wrote {} ({} bytes)", path.display(), artifact.content.len());
        Ok(path)
    }
}
