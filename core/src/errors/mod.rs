pub mod config_error;
pub mod operation_error;
pub mod runner_error;

pub use config_error::ConfigError;
pub use operation_error::{GatewayError, OperationError};
pub use runner_error::RunnerError;

/// Render an error and its whole `source()` chain.
pub fn diagnostic(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(src) = cur {
        out.push_str("\nCaused by: ");
        out.push_str(&src.to_string());
        cur = src.source();
    }
    out
}
