// core/src/errors/runner_error.rs
use thiserror::Error;

/// Failures the process runner can report instead of a completed outcome.
///
/// Launch problems the runner can name precisely are "command-line" failures
/// and carry a shell-style exit code. Everything else is a fault.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("command line is empty")]
    EmptyCommand,

    #[error("malformed command line: {reason}")]
    MalformedCommand { reason: String },

    #[error("'{program}' is not recognized as a program")]
    NotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("permission denied launching '{program}'")]
    PermissionDenied {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("working directory is not accessible: {dir}")]
    InvalidWorkingDirectory { dir: String },

    #[error("failed to spawn process: {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error while collecting {stream}")]
    StreamIo {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("process did not finish within {timeout_ms}ms and was killed")]
    Timeout { timeout_ms: u64 },
}

impl RunnerError {
    /// Exit code for failures recognized as command-line problems.
    ///
    /// Returns `None` for unclassified faults.
    pub fn command_line_exit_code(&self) -> Option<i32> {
        match self {
            RunnerError::EmptyCommand | RunnerError::MalformedCommand { .. } => Some(2),
            RunnerError::NotFound { .. } => Some(127),
            RunnerError::PermissionDenied { .. } => Some(126),
            RunnerError::InvalidWorkingDirectory { .. } => Some(1),
            RunnerError::Spawn { .. } | RunnerError::StreamIo { .. } | RunnerError::Timeout { .. } => {
                None
            }
        }
    }

    pub fn is_command_line_failure(&self) -> bool {
        self.command_line_exit_code().is_some()
    }

    /// Map a spawn-time io error onto the most specific variant.
    pub fn from_spawn(program: &str, source: std::io::Error) -> Self {
        let program = program.to_string();
        match source.kind() {
            std::io::ErrorKind::NotFound => RunnerError::NotFound { program, source },
            std::io::ErrorKind::PermissionDenied => RunnerError::PermissionDenied { program, source },
            std::io::ErrorKind::InvalidInput => RunnerError::MalformedCommand {
                reason: source.to_string(),
            },
            _ => RunnerError::Spawn { program, source },
        }
    }
}
