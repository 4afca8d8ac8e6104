use std::panic::AssertUnwindSafe;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use futures::FutureExt;
use uuid::Uuid;

use kiln_core::api::{
    catalog, default_filters, document, resolve, run_delete, run_push_deploy, ApiDocument,
    CommandInput, CommandResponse, CommandResult, DeleteOutcome, GatewayResponse, OperationKind,
    OperationResult, OperationStatus,
};

use crate::http::{
    models::{DeployQuery, HealthResponse, HttpServerError},
    state::AppState,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/command", post(command_handler))
        .route("/api/zipdeploy", post(zipdeploy_handler))
        .route("/api/zipdeploy/:id", get(zipdeploy_status_handler))
        .route("/api/deployments/:id/result", get(deployment_result_handler))
        .route("/api/deployments/:id", axum::routing::delete(delete_deployment_handler))
        .route("/api/docs", get(docs_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// POST /api/command
async fn command_handler(
    State(state): State<AppState>,
    body: Result<Json<CommandInput>, JsonRejection>,
) -> Result<Json<CommandResult>, HttpServerError> {
    state.record_request("/api/command");

    let input = match body {
        Ok(Json(input)) => Some(input),
        Err(rejection) => {
            tracing::debug!(target: "kiln.http", error = %rejection, "rejected command body");
            None
        }
    };

    match state.ctx.command_service().execute_input(input).await {
        CommandResponse::Completed(execution) => Ok(Json(CommandResult::from(execution.outcome()))),
        CommandResponse::BadRequest(reason) => {
            state.record_error();
            Err(HttpServerError::BadRequest(reason))
        }
    }
}

/// POST /api/zipdeploy[?isAsync=true]
async fn zipdeploy_handler(
    State(state): State<AppState>,
    Query(query): Query<DeployQuery>,
    payload: Bytes,
) -> Result<Response, HttpServerError> {
    state.record_request("/api/zipdeploy");

    let id = Uuid::new_v4().to_string();
    let registry = state.ctx.operations().clone();
    registry.begin(id.clone(), OperationStatus::Pending)?;

    let plugin = state.ctx.services().deploy.clone();
    let task_registry = registry.clone();
    let task_id = id.clone();
    tokio::spawn(async move {
        let driven = AssertUnwindSafe(run_push_deploy(&task_registry, plugin, &task_id, payload))
            .catch_unwind()
            .await;
        match driven {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::error!(target: "kiln.deploy", id = %task_id, error = %e, "push deploy aborted");
            }
            Err(_) => {
                tracing::error!(target: "kiln.deploy", id = %task_id, "push deploy panicked");
                let failed = OperationStatus::Failed(OperationResult::failed(500, "deployment panicked"));
                if let Err(e) = task_registry.advance(&task_id, failed) {
                    tracing::warn!(target: "kiln.deploy", id = %task_id, error = %e, "could not record failure");
                }
            }
        }
    });

    let location = format!("/api/zipdeploy/{id}");
    if query.is_async {
        let resp = resolve(OperationKind::PushDeploy, &id, &OperationStatus::Pending)?;
        let mut response = gateway_response(resp);
        if let Ok(value) = header::HeaderValue::from_str(&location) {
            response.headers_mut().insert(header::LOCATION, value);
        }
        return Ok(response);
    }

    let terminal = registry.wait_terminal(&id).await?;
    Ok(gateway_response(resolve(OperationKind::PushDeploy, &id, &terminal)?))
}

/// GET /api/zipdeploy/:id
async fn zipdeploy_status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HttpServerError> {
    state.record_request("/api/zipdeploy/:id");
    poll(&state, OperationKind::PushDeploy, &id)
}

/// GET /api/deployments/:id/result
async fn deployment_result_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HttpServerError> {
    state.record_request("/api/deployments/:id/result");
    poll(&state, OperationKind::DeploymentResult, &id)
}

fn poll(state: &AppState, kind: OperationKind, id: &str) -> Result<Response, HttpServerError> {
    let status = state
        .ctx
        .operations()
        .get(id)
        .ok_or_else(|| HttpServerError::NotFound(format!("unknown operation '{id}'")))?;
    Ok(gateway_response(resolve(kind, id, &status)?))
}

/// DELETE /api/deployments/:id
async fn delete_deployment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HttpServerError> {
    state.record_request("/api/deployments/:id");

    let outcome = run_delete(
        state.ctx.operations(),
        state.ctx.deletions(),
        state.ctx.services().deploy.clone(),
        &id,
    )
    .await
    .map_err(|e| HttpServerError::Internal(format!("{e:#}")))?;

    match outcome {
        DeleteOutcome::NotFound => Err(HttpServerError::NotFound(format!(
            "no deployment staged under '{id}'"
        ))),
        DeleteOutcome::InProgress => Err(HttpServerError::Conflict(format!(
            "deployment '{id}' is still in progress"
        ))),
        DeleteOutcome::Status(OperationStatus::Failed(result)) => Ok(gateway_response(GatewayResponse {
            status: result.status,
            body: result.body,
        })),
        DeleteOutcome::Status(status) => Ok(gateway_response(resolve(
            OperationKind::ResourceDelete,
            &id,
            &status,
        )?)),
    }
}

/// GET /api/docs
async fn docs_handler(State(state): State<AppState>) -> Json<ApiDocument> {
    state.record_request("/api/docs");
    Json(document(catalog(), &default_filters()))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (uptime_seconds, requests_handled, errors, requests_by_endpoint) = {
        let stats = state
            .stats
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        (
            stats.uptime_seconds(),
            stats.requests_total,
            stats.errors_total,
            stats.requests_by_endpoint.clone(),
        )
    };

    Json(HealthResponse {
        status: "healthy".into(),
        session_id: state.session_id.clone(),
        uptime_seconds,
        requests_handled,
        errors,
        requests_by_endpoint,
        operations: state.ctx.operations().len(),
        timestamp: Local::now().to_rfc3339(),
    })
}

fn gateway_response(resp: GatewayResponse) -> Response {
    let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match resp.body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use kiln_core::api::{AppConfig, AppContext, DeployPlugin, Services};
    use kiln_plugins::deploy::StagingDeployPlugin;
    use kiln_plugins::runner::ShellProcessRunner;
    use kiln_plugins::tracer::RecordingTracer;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;
    use tower::ServiceExt;

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
            false
        }

        async fn remove(&self, _id: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    fn state_with(deploy: Arc<dyn DeployPlugin>) -> (AppState, RecordingTracer) {
        let cfg = AppConfig::default();
        let tracer = RecordingTracer::new();
        let services = Services {
            runner: Arc::new(ShellProcessRunner::new(&cfg.command)),
            tracer: Arc::new(tracer.clone()),
            deploy,
        };
        let ctx = AppContext::with_services(cfg, services);
        (AppState::new("test-session".into(), ctx), tracer)
    }

    fn staging_state(dir: &std::path::Path) -> (AppState, RecordingTracer) {
        state_with(Arc::new(StagingDeployPlugin::with_dir(dir)))
    }

    async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = create_router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_echo_returns_output() {
        let dir = tempfile::tempdir().unwrap();
        let (state, tracer) = staging_state(dir.path());

        let (status, body) = send(
            &state,
            json_request(Method::POST, "/api/command", json!({"command": "echo hello", "dir": ""})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"Output": "hello\n", "Error": "", "ExitCode": 0}));
        assert_eq!(tracer.opened(), 1);
        assert_eq!(tracer.closed_once(), 1);
    }

    #[tokio::test]
    async fn command_without_body_or_command_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let (state, tracer) = staging_state(dir.path());

        let (status, _) = send(&state, empty_request(Method::POST, "/api/command")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &state,
            json_request(Method::POST, "/api/command", json!({"command": "", "dir": "/tmp"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&state, json_request(Method::POST, "/api/command", Value::Null)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let malformed = Request::builder()
            .method(Method::POST)
            .uri("/api/command")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&state, malformed).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].is_string());

        assert_eq!(tracer.opened(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unknown_binary_is_reported_with_200() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = staging_state(dir.path());

        let (status, body) = send(
            &state,
            json_request(
                Method::POST,
                "/api/command",
                json!({"command": "nonexistent-binary-xyz", "dir": "/tmp"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_ne!(body["ExitCode"], json!(0));
        assert_ne!(body["Error"], json!(""));
    }

    #[tokio::test]
    async fn async_push_deploy_polls_202_then_200() {
        let release = Arc::new(Notify::new());
        let (state, _) = state_with(Arc::new(GatedDeploy {
            release: release.clone(),
        }));

        let response = create_router(state.clone())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/zipdeploy?isAsync=true")
                    .body(Body::from("PK\x03\x04"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let location = response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let accepted: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(accepted["complete"], json!(false));

        let (status, _) = send(&state, empty_request(Method::GET, &location)).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        release.notify_one();
        let mut last = send(&state, empty_request(Method::GET, &location)).await;
        for _ in 0..200 {
            if last.0 != StatusCode::ACCEPTED {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            last = send(&state, empty_request(Method::GET, &location)).await;
        }
        assert_eq!(last.0, StatusCode::OK);
        let done: Value = serde_json::from_slice(&last.1).unwrap();
        assert_eq!(done["complete"], json!(true));
        assert_eq!(done["id"], accepted["id"]);

        // terminal answers do not change on repeat
        let again = send(&state, empty_request(Method::GET, &location)).await;
        assert_eq!(again, last);
    }

    #[tokio::test]
    async fn sync_push_deploy_then_delete_twice() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = staging_state(dir.path());

        let (status, body) = send(
            &state,
            Request::builder()
                .method(Method::POST)
                .uri("/api/zipdeploy")
                .body(Body::from("PK\x03\x04"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        let id = body["id"].as_str().unwrap().to_string();
        assert!(dir.path().join(format!("{id}.zip")).exists());

        let (status, body) = send(
            &state,
            empty_request(Method::GET, &format!("/api/deployments/{id}/result")),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let uri = format!("/api/deployments/{id}");
        let first = send(&state, empty_request(Method::DELETE, &uri)).await;
        assert_eq!(first.0, StatusCode::NO_CONTENT);
        assert!(first.1.is_empty());
        assert!(!dir.path().join(format!("{id}.zip")).exists());

        let second = send(&state, empty_request(Method::DELETE, &uri)).await;
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn delete_records_are_not_pollable_as_deploys() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = staging_state(dir.path());

        let (_, body) = send(
            &state,
            Request::builder()
                .method(Method::POST)
                .uri("/api/zipdeploy")
                .body(Body::from("PK\x03\x04"))
                .unwrap(),
        )
        .await;
        let body: Value = serde_json::from_slice(&body).unwrap();
        let id = body["id"].as_str().unwrap().to_string();

        let (status, _) = send(&state, empty_request(Method::DELETE, &format!("/api/deployments/{id}"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        for uri in [
            format!("/api/zipdeploy/delete:{id}"),
            format!("/api/deployments/delete:{id}/result"),
        ] {
            let (status, _) = send(&state, empty_request(Method::GET, &uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }

        // the push deploy itself still answers with its terminal status
        let (status, _) = send(&state, empty_request(Method::GET, &format!("/api/zipdeploy/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.ctx.deletions().len(), 1);
    }

    #[tokio::test]
    async fn empty_package_fails_with_underlying_status() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = staging_state(dir.path());

        let (status, body) = send(&state, empty_request(Method::POST, "/api/zipdeploy")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn unknown_ids_are_404() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = staging_state(dir.path());

        for req in [
            empty_request(Method::GET, "/api/zipdeploy/nope"),
            empty_request(Method::GET, "/api/deployments/nope/result"),
            empty_request(Method::DELETE, "/api/deployments/nope"),
        ] {
            let (status, _) = send(&state, req).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn docs_lists_filtered_operations() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = staging_state(dir.path());

        let (status, body) = send(&state, empty_request(Method::GET, "/api/docs")).await;
        assert_eq!(status, StatusCode::OK);
        let doc: Value = serde_json::from_slice(&body).unwrap();
        let ops = doc["operations"].as_array().unwrap();
        let push = ops
            .iter()
            .find(|op| op["operationId"] == json!("PushDeployment_ZipPushDeploy"))
            .unwrap();
        assert_eq!(push["parameters"][0]["name"], json!("file"));
        assert!(push["responses"].as_array().unwrap().contains(&json!(202)));
    }

    #[tokio::test]
    async fn health_reports_counters() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = staging_state(dir.path());
        send(&state, empty_request(Method::GET, "/api/docs")).await;

        let response = health_handler(State(state.clone())).await;
        assert_eq!(response.0.status, "healthy");
        assert_eq!(response.0.session_id, "test-session");
        assert_eq!(response.0.requests_handled, 1);
        assert_eq!(response.0.requests_by_endpoint.get("/api/docs"), Some(&1));
    }
}
