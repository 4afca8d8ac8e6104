mod service;
mod types;

pub use service::CommandService;
pub use types::{CommandInput, CommandRequest, CommandResponse, CommandResult};
