// core/src/errors/operation_error.rs
use thiserror::Error;

use crate::operation::OperationKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("operation not found: {id}")]
    NotFound { id: String },

    #[error("operation already exists: {id}")]
    AlreadyExists { id: String },

    #[error("operation {id} already reached terminal state {current}")]
    AlreadyTerminal { id: String, current: &'static str },

    #[error("operation {id} cannot move from {from} back to {to}")]
    Regression {
        id: String,
        from: &'static str,
        to: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("{kind} defines no response for status {status}")]
    NotApplicable {
        kind: OperationKind,
        status: &'static str,
    },
}
