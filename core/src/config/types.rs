use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http_server: HttpServerConfig,

    #[serde(default)]
    pub command: CommandConfig,

    #[serde(default)]
    pub deployment: DeploymentConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for a whole request, including a synchronous push deploy.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Program used to interpret the command line.
    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default = "default_shell_arg")]
    pub shell_arg: String,

    /// Directory used when a request leaves `dir` empty. Empty means the
    /// server's own working directory.
    #[serde(default)]
    pub default_dir: String,

    /// 0 disables the timeout.
    #[serde(default)]
    pub timeout_ms: u64,
}

#[cfg(windows)]
fn default_shell() -> String {
    "cmd".to_string()
}

#[cfg(not(windows))]
fn default_shell() -> String {
    "sh".to_string()
}

#[cfg(windows)]
fn default_shell_arg() -> String {
    "/C".to_string()
}

#[cfg(not(windows))]
fn default_shell_arg() -> String {
    "-c".to_string()
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            shell_arg: default_shell_arg(),
            default_dir: String::new(),
            timeout_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,

    /// Upper bound on deploy and delete records kept in memory; finished
    /// records beyond it are forgotten oldest first.
    #[serde(default = "default_retained_operations")]
    pub retained_operations: usize,
}

fn default_staging_dir() -> String {
    "~/.kiln/deployments".to_string()
}

fn default_retained_operations() -> usize {
    crate::operation::DEFAULT_RETAINED_OPERATIONS
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            retained_operations: default_retained_operations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// When set, logs are also written to a daily rolling file here.
    #[serde(default)]
    pub directory: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
        }
    }
}
