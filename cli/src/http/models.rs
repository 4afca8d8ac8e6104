use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use kiln_core::api::{GatewayError, OperationError};

/// Errors a handler can turn into a transport status.
#[derive(Debug, Error)]
pub enum HttpServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl HttpServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpServerError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpServerError::Conflict(_) => StatusCode::CONFLICT,
            HttpServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

impl From<GatewayError> for HttpServerError {
    fn from(e: GatewayError) -> Self {
        HttpServerError::Conflict(e.to_string())
    }
}

impl From<OperationError> for HttpServerError {
    fn from(e: OperationError) -> Self {
        match e {
            OperationError::NotFound { .. } => HttpServerError::NotFound(e.to_string()),
            OperationError::AlreadyExists { .. } => HttpServerError::Conflict(e.to_string()),
            OperationError::AlreadyTerminal { .. } | OperationError::Regression { .. } => {
                HttpServerError::Internal(e.to_string())
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Query string of `POST /api/zipdeploy`.
#[derive(Debug, Default, Deserialize)]
pub struct DeployQuery {
    #[serde(rename = "isAsync", default)]
    pub is_async: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_id: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub errors: u64,
    pub requests_by_endpoint: BTreeMap<String, u64>,
    pub operations: usize,
    pub timestamp: String,
}
