use kiln_core::api::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialise logging: {0}")]
    Logging(String),

    #[error("failed to build services: {0:#}")]
    Services(anyhow::Error),

    #[error("http server error: {0}")]
    Server(String),

    #[error("{0}")]
    Command(String),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}
