// core/src/errors/config_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("config file unreadable: {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error")]
    Parse(#[source] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),

    #[error("env var invalid: {key}={value}")]
    EnvInvalid { key: String, value: String },
}
