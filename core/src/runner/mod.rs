pub mod exit;
mod traits;
mod types;

pub use traits::RunnerPlugin;
pub use types::CommandOutcome;

use crate::errors::{diagnostic, RunnerError};

/// How an execution ended, decided once at the runner boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    /// The child ran to completion, whatever its exit code.
    Success(CommandOutcome),
    /// The launch failed in a way the runner recognizes.
    RecognizedFailure(CommandOutcome),
    /// Anything else; exit code is always `-1`.
    UnclassifiedFault(CommandOutcome),
}

pub const FAULT_EXIT_CODE: i32 = -1;

impl Execution {
    pub fn classify(result: Result<CommandOutcome, RunnerError>) -> Self {
        match result {
            Ok(outcome) => Execution::Success(outcome),
            Err(err) => match err.command_line_exit_code() {
                Some(code) => Execution::RecognizedFailure(CommandOutcome::failure(err.to_string(), code)),
                None => Execution::fault(diagnostic(&err)),
            },
        }
    }

    pub fn fault(diagnostic: impl Into<String>) -> Self {
        Execution::UnclassifiedFault(CommandOutcome::failure(diagnostic, FAULT_EXIT_CODE))
    }

    pub fn outcome(&self) -> &CommandOutcome {
        match self {
            Execution::Success(o) | Execution::RecognizedFailure(o) | Execution::UnclassifiedFault(o) => o,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Execution::Success(_) => "success",
            Execution::RecognizedFailure(_) => "recognized_failure",
            Execution::UnclassifiedFault(_) => "unclassified_fault",
        }
    }
}
