use async_trait::async_trait;

use crate::errors::RunnerError;

use super::types::CommandOutcome;

/// Runs one command line as a child process.
///
/// `working_dir` may be empty, meaning the runner's default directory.
/// A child that exits non-zero is still `Ok`; `Err` is reserved for launches
/// that failed or executions that could not be observed to completion.
/// Implementations must not leave the child running or its pipes unread on
/// any return path.
#[async_trait]
pub trait RunnerPlugin: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, command: &str, working_dir: &str) -> Result<CommandOutcome, RunnerError>;
}
