mod deploy;
pub mod gateway;
mod registry;
mod status;

pub use deploy::{run_delete, run_push_deploy, DeleteOutcome, DeployPlugin};
pub use gateway::{placeholder_body, resolve, GatewayResponse, OperationKind};
pub use registry::{OperationRegistry, DEFAULT_RETAINED_OPERATIONS};
pub use status::{OperationResult, OperationStatus, Transition};
