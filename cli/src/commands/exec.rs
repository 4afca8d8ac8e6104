use kiln_core::api::{AppContext, CommandRequest, CommandResponse, CommandResult};

use crate::commands::cli::ExecArgs;
use crate::error::CliError;

/// Run one command through the command service and print the JSON result.
///
/// Returns the process exit code to use: the command's own code when it fits
/// in a process status, `1` otherwise.
pub async fn handle_exec(args: ExecArgs, ctx: &AppContext) -> Result<i32, CliError> {
    let request = CommandRequest::new(args.command, args.dir).map_err(CliError::Command)?;

    let result = match ctx.command_service().execute(&request).await {
        CommandResponse::Completed(execution) => CommandResult::from(execution.outcome()),
        CommandResponse::BadRequest(reason) => return Err(CliError::Command(reason)),
    };
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(process_code(result.exit_code))
}

fn process_code(exit_code: i32) -> i32 {
    if (0..=255).contains(&exit_code) {
        exit_code
    } else {
        1
    }
}
