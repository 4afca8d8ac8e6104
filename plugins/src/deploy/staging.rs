use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use kiln_core::api::{DeployPlugin, DeploymentConfig, OperationResult};

/// Stages uploaded archives as `<staging_dir>/<id>.zip`.
pub struct StagingDeployPlugin {
    staging_dir: PathBuf,
}

impl StagingDeployPlugin {
    pub fn new(cfg: &DeploymentConfig) -> Self {
        Self::with_dir(PathBuf::from(
            shellexpand::tilde(cfg.staging_dir.trim()).as_ref(),
        ))
    }

    pub fn with_dir(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    /// `None` for ids that would escape the staging directory.
    fn archive_path(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.staging_dir.join(format!("{id}.zip")))
    }
}

#[async_trait]
impl DeployPlugin for StagingDeployPlugin {
    fn name(&self) -> &str {
        "staging"
    }

    async fn deploy(&self, id: &str, payload: Bytes) -> OperationResult {
        let Some(path) = self.archive_path(id) else {
            return OperationResult::failed(400, format!("invalid deployment id '{id}'"));
        };
        if payload.is_empty() {
            return OperationResult::failed(400, "deployment package is empty");
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.staging_dir).await {
            tracing::error!(
                target: "kiln.deploy",
                dir = %self.staging_dir.display(),
                error = %e,
                "failed to create staging directory"
            );
            return OperationResult::failed(500, format!("failed to create staging directory: {e}"));
        }
        if let Err(e) = tokio::fs::write(&path, &payload).await {
            tracing::error!(
                target: "kiln.deploy",
                path = %path.display(),
                error = %e,
                "failed to stage deployment package"
            );
            return OperationResult::failed(500, format!("failed to stage deployment package: {e}"));
        }

        tracing::info!(target: "kiln.deploy", id, path = %path.display(), "deployment package staged");
        OperationResult::no_content()
    }

    async fn exists(&self, id: &str) -> bool {
        match self.archive_path(id) {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }

    async fn remove(&self, id: &str) -> anyhow::Result<bool> {
        let Some(path) = self.archive_path(id) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(anyhow::Error::new(e).context(format!("removing {}", path.display()))),
        }
    }
}
