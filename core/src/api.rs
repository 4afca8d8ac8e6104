//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `kiln_core::api` instead of reaching into internal modules.

pub use crate::command::{CommandInput, CommandRequest, CommandResponse, CommandResult, CommandService};
pub use crate::config::{
    AppConfig, CommandConfig, DeploymentConfig, HttpServerConfig, LoggingConfig,
};
pub use crate::context::AppContext;
pub use crate::docs::{catalog, default_filters, document, ApiDocument};
pub use crate::errors::{ConfigError, GatewayError, OperationError, RunnerError};
pub use crate::operation::{
    placeholder_body, resolve, run_delete, run_push_deploy, DeleteOutcome,
    DeployPlugin, GatewayResponse, OperationKind, OperationRegistry, OperationResult,
    OperationStatus,
};
pub use crate::runner::{exit::normalize_exit, CommandOutcome, Execution, RunnerPlugin, FAULT_EXIT_CODE};
pub use crate::services::{Services, ServicesFactory};
pub use crate::trace::{StepSink, TraceSpan, TraceStep, TracerPlugin};
