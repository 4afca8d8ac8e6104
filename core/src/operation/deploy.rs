use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::OperationError;

use super::registry::OperationRegistry;
use super::status::{OperationResult, OperationStatus};

/// The deployment pipeline, seen from the status protocol.
///
/// `deploy` reports its terminal response as data; a failed deployment is an
/// `OperationResult` with a non-2xx status, not an `Err`.
#[async_trait]
pub trait DeployPlugin: Send + Sync {
    fn name(&self) -> &str;

    async fn deploy(&self, id: &str, payload: Bytes) -> OperationResult;

    async fn exists(&self, id: &str) -> bool;

    /// Returns `false` when there was nothing to remove.
    async fn remove(&self, id: &str) -> anyhow::Result<bool>;
}

/// Drive one push deploy from `Pending` to its terminal status.
///
/// The operation must already be registered as `Pending`.
pub async fn run_push_deploy(
    registry: &OperationRegistry,
    plugin: Arc<dyn DeployPlugin>,
    id: &str,
    payload: Bytes,
) -> Result<OperationStatus, OperationError> {
    registry.advance(id, OperationStatus::Accepted)?;
    tracing::info!(
        target: "kiln.deploy",
        id,
        bytes = payload.len(),
        plugin = plugin.name(),
        "deployment accepted"
    );

    let result = plugin.deploy(id, payload).await;
    let terminal = OperationStatus::finished(result);
    if let OperationStatus::Failed(r) = &terminal {
        tracing::warn!(target: "kiln.deploy", id, status = r.status, "deployment failed");
    } else {
        tracing::info!(target: "kiln.deploy", id, "deployment finished");
    }

    registry.advance(id, terminal.clone())?;
    Ok(terminal)
}

#[derive(Debug)]
pub enum DeleteOutcome {
    /// Nothing was deployed under that id.
    NotFound,
    /// The deployment is still running and cannot be removed yet.
    InProgress,
    /// Current status of the delete operation.
    Status(OperationStatus),
}

/// Remove a finished deployment, tracking the removal as its own operation.
///
/// Delete records live in `deletes`, apart from the push deploys in `deploys`,
/// and are keyed by the deployment id. Repeating a completed delete returns
/// the same terminal status.
pub async fn run_delete(
    deploys: &OperationRegistry,
    deletes: &OperationRegistry,
    plugin: Arc<dyn DeployPlugin>,
    id: &str,
) -> anyhow::Result<DeleteOutcome> {
    if let Some(status) = deletes.get(id) {
        return Ok(DeleteOutcome::Status(status));
    }

    match deploys.get(id) {
        Some(status) if !status.is_terminal() => return Ok(DeleteOutcome::InProgress),
        _ => {}
    }
    if !plugin.exists(id).await {
        return Ok(DeleteOutcome::NotFound);
    }

    match deletes.begin(id, OperationStatus::Pending) {
        Ok(()) => {}
        // a concurrent delete got there first
        Err(OperationError::AlreadyExists { .. }) => {
            return Ok(DeleteOutcome::Status(
                deletes.get(id).unwrap_or(OperationStatus::Pending),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let terminal = match plugin.remove(id).await {
        Ok(true) => OperationStatus::Removed,
        Ok(false) => OperationStatus::Failed(OperationResult::failed(404, "deployment not found")),
        Err(e) => {
            tracing::error!(target: "kiln.deploy", id, error = %e, "failed to remove deployment");
            OperationStatus::Failed(OperationResult::failed(500, e.to_string()))
        }
    };
    deletes.advance(id, terminal.clone())?;
    Ok(DeleteOutcome::Status(terminal))
}
