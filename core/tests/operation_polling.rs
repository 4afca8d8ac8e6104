//! Poll-until-done behaviour of the status gateway over a live registry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use kiln_core::api::{
    resolve, run_delete, run_push_deploy, DeleteOutcome, DeployPlugin, OperationKind,
    OperationRegistry, OperationResult, OperationStatus,
};
use tokio::sync::Notify;

/// Deploy plugin that blocks until released.
struct GatedDeploy {
    release: Arc<Notify>,
}

#[async_trait]
impl DeployPlugin for GatedDeploy {
    fn name(&self) -> &str {
        "gated"
    }

    async fn deploy(&self, _id: &str, _payload: Bytes) -> OperationResult {
        self.release.notified().await;
        OperationResult::no_content()
    }

    async fn exists(&self, _id: &str) -> bool {
        true
    }

    async fn remove(&self, _id: &str) -> anyhow::Result<bool> {
        Ok(true)
    }
}

fn keys(v: &serde_json::Value) -> Vec<String> {
    let mut k: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
    k.sort();
    k
}

#[tokio::test]
async fn push_deploy_polls_202_until_done_then_200_with_same_shape() {
    let registry = OperationRegistry::new();
    let release = Arc::new(Notify::new());
    let plugin: Arc<dyn DeployPlugin> = Arc::new(GatedDeploy {
        release: release.clone(),
    });

    registry.begin("dep-1", OperationStatus::Pending).unwrap();
    let driver = {
        let registry = registry.clone();
        tokio::spawn(async move {
            run_push_deploy(&registry, plugin, "dep-1", Bytes::from_static(b"PK\x03\x04")).await
        })
    };

    let mut provisional_body = None;
    for _ in 0..5 {
        let status = registry.get("dep-1").unwrap();
        let resp = resolve(OperationKind::PushDeploy, "dep-1", &status).unwrap();
        assert_eq!(resp.status, 202);
        provisional_body = resp.body;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    release.notify_one();
    let terminal = tokio::time::timeout(Duration::from_secs(5), driver)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(terminal.is_terminal());

    let resp = resolve(OperationKind::PushDeploy, "dep-1", &registry.get("dep-1").unwrap()).unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(keys(&resp.body.unwrap()), keys(&provisional_body.unwrap()));
}

#[tokio::test]
async fn terminal_status_never_flaps_back() {
    let registry = OperationRegistry::new();
    registry.begin("dep-2", OperationStatus::Pending).unwrap();
    registry
        .advance(
            "dep-2",
            OperationStatus::Failed(OperationResult::failed(500, "extract failed")),
        )
        .unwrap();

    assert!(registry.advance("dep-2", OperationStatus::Accepted).is_err());

    let first = resolve(
        OperationKind::DeploymentResult,
        "dep-2",
        &registry.get("dep-2").unwrap(),
    )
    .unwrap();
    for _ in 0..10 {
        let again = resolve(
            OperationKind::DeploymentResult,
            "dep-2",
            &registry.get("dep-2").unwrap(),
        )
        .unwrap();
        assert_eq!(again, first);
    }
    assert_eq!(first.status, 500);
}

#[tokio::test]
async fn completed_delete_answers_204_with_empty_body() {
    let registry = OperationRegistry::new();
    let plugin: Arc<dyn DeployPlugin> = Arc::new(GatedDeploy {
        release: Arc::new(Notify::new()),
    });

    let deletes = OperationRegistry::new();
    let outcome = run_delete(&registry, &deletes, plugin, "dep-3").await.unwrap();
    let DeleteOutcome::Status(status) = outcome else {
        panic!("expected a delete status, got {outcome:?}");
    };
    let resp = resolve(OperationKind::ResourceDelete, "dep-3", &status).unwrap();
    assert_eq!(resp.status, 204);
    assert!(resp.body.is_none());
}
