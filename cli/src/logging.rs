use std::path::PathBuf;

use kiln_core::api::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::CliError;

const LOG_FILE_PREFIX: &str = "kiln.log";

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
///
/// The returned guard flushes the file writer and must live until exit.
pub fn init_logging(cfg: &LoggingConfig) -> Result<Option<WorkerGuard>, CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .map_err(|e| CliError::Logging(format!("invalid log level '{}': {e}", cfg.level)))?;

    let (file_layer, guard) = match log_dir(cfg) {
        Some(dir) => {
            std::fs::create_dir_all(&dir).map_err(|e| {
                CliError::Logging(format!("cannot create log directory {}: {e}", dir.display()))
            })?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    Ok(guard)
}

fn log_dir(cfg: &LoggingConfig) -> Option<PathBuf> {
    let dir = cfg.directory.trim();
    if dir.is_empty() {
        return None;
    }
    Some(PathBuf::from(shellexpand::tilde(dir).as_ref()))
}
