use serde::{Deserialize, Serialize};

use crate::runner::{CommandOutcome, Execution};

/// Request body as it arrives on the wire. Both fields may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandInput {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
}

/// A validated command request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    command: String,
    working_directory: String,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>, working_directory: impl Into<String>) -> Result<Self, String> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err("command must not be empty".to_string());
        }
        Ok(Self {
            command,
            working_directory: working_directory.into(),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn working_directory(&self) -> &str {
        &self.working_directory
    }
}

impl TryFrom<CommandInput> for CommandRequest {
    type Error = String;

    fn try_from(input: CommandInput) -> Result<Self, Self::Error> {
        let command = input
            .command
            .ok_or_else(|| "missing field `command`".to_string())?;
        CommandRequest::new(command, input.dir.unwrap_or_default())
    }
}

/// Response body of the command endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    #[serde(rename = "Output")]
    pub output: String,
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "ExitCode")]
    pub exit_code: i32,
}

impl From<&CommandOutcome> for CommandResult {
    fn from(o: &CommandOutcome) -> Self {
        Self {
            output: o.output().to_string(),
            error: o.error().to_string(),
            exit_code: o.exit_code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResponse {
    Completed(Execution),
    BadRequest(String),
}

impl CommandResponse {
    /// Transport status: always 200 once a command was attempted.
    pub fn status_code(&self) -> u16 {
        match self {
            CommandResponse::Completed(_) => 200,
            CommandResponse::BadRequest(_) => 400,
        }
    }

    pub fn result(&self) -> Option<CommandResult> {
        match self {
            CommandResponse::Completed(exec) => Some(CommandResult::from(exec.outcome())),
            CommandResponse::BadRequest(_) => None,
        }
    }
}
