use serde::{Deserialize, Serialize};

/// Structured result of one command execution.
///
/// The constructors keep `exit_code == 0` paired with an empty `error` and any
/// other exit code paired with a non-empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    output: String,
    error: String,
    exit_code: i32,
}

impl CommandOutcome {
    /// Outcome of a child process that ran to completion.
    pub fn from_exit(output: String, stderr: String, exit_code: i32) -> Self {
        if exit_code == 0 {
            return Self {
                output,
                error: String::new(),
                exit_code,
            };
        }
        let error = if stderr.trim().is_empty() {
            format!("process exited with code {exit_code}")
        } else {
            stderr
        };
        Self {
            output,
            error,
            exit_code,
        }
    }

    /// Outcome for an execution that never produced a usable exit status.
    pub fn failure(error: impl Into<String>, exit_code: i32) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "command failed".to_string();
        }
        Self {
            output: String::new(),
            error,
            exit_code: if exit_code == 0 { -1 } else { exit_code },
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}
