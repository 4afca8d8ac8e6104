use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub fn create_middleware_stack(
    request_timeout: Duration,
) -> tower::layer::util::Stack<CorsLayer, TimeoutLayer> {
    tower::layer::util::Stack::new(create_cors_layer(), create_timeout_layer(request_timeout))
}

/// Browser callers are limited to local origins.
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(is_local_origin)
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers([header::LOCATION, REQUEST_ID_HEADER])
        .max_age(Duration::from_secs(3600))
}

fn is_local_origin(origin: &str) -> bool {
    ["http://localhost", "https://localhost", "http://127.0.0.1", "https://127.0.0.1"]
        .iter()
        .any(|prefix| {
            origin
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(':'))
        })
}

/// Covers synchronous push deploys too, so it is sized from config.
fn create_timeout_layer(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::new(request_timeout)
}

pub fn create_trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Logs one line per request and tags the response with a request id.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let request_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let start = Instant::now();

    let mut response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        warn!(
            target: "kiln.http",
            %method,
            %uri,
            status = status.as_u16(),
            duration_ms,
            request_id = %request_id,
            "request failed"
        );
    } else {
        info!(
            target: "kiln.http",
            %method,
            %uri,
            status = status.as_u16(),
            duration_ms,
            request_id = %request_id,
            "request completed"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
