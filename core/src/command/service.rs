use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::Instrument;

use crate::runner::{Execution, RunnerPlugin};
use crate::trace::{TraceSpan, TracerPlugin};

use super::types::{CommandInput, CommandRequest, CommandResponse};

/// Runs command requests through a runner inside a single trace step.
#[derive(Clone)]
pub struct CommandService {
    runner: Arc<dyn RunnerPlugin>,
    tracer: Arc<dyn TracerPlugin>,
}

impl CommandService {
    pub fn new(runner: Arc<dyn RunnerPlugin>, tracer: Arc<dyn TracerPlugin>) -> Self {
        Self { runner, tracer }
    }

    /// Entry point for raw request bodies; `None` means the body was absent or
    /// could not be parsed.
    pub async fn execute_input(&self, input: Option<CommandInput>) -> CommandResponse {
        let Some(input) = input else {
            return CommandResponse::BadRequest("request body is missing or malformed".into());
        };
        match CommandRequest::try_from(input) {
            Ok(request) => self.execute(&request).await,
            Err(reason) => CommandResponse::BadRequest(reason),
        }
    }

    pub async fn execute(&self, request: &CommandRequest) -> CommandResponse {
        let command = request.command();
        let dir = request.working_directory();

        let mut step = self.tracer.step(
            TraceSpan::new(format!("Executing {command}")).with_tag("CWD", dir),
        );
        let span = step.span();

        let run = AssertUnwindSafe(self.runner.run(command, dir))
            .catch_unwind()
            .instrument(span)
            .await;

        let execution = match run {
            Ok(Ok(outcome)) => Execution::Success(outcome),
            Ok(Err(err)) => {
                step.record_error(&err);
                Execution::classify(Err(err))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                step.record_error_message(&message);
                Execution::fault(message)
            }
        };

        tracing::debug!(
            target: "kiln.command",
            kind = execution.kind(),
            exit_code = execution.outcome().exit_code(),
            "command finished"
        );

        drop(step);
        CommandResponse::Completed(execution)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("runner panicked: {detail}")
}
