use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use kiln_core::api::AppConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "kiln", version, about = "Remote command execution and deployment server")]
pub struct Args {
    /// Path to a config file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// CLI flags override file and environment values.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(host) = &self.host {
            cfg.http_server.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.http_server.port = port;
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExecArgs {
    /// Command line, passed to the configured shell as one argument.
    pub command: String,

    /// Working directory; empty means `command.default_dir`.
    #[arg(long, default_value = "")]
    pub dir: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Run one command and print the JSON result.
    Exec(ExecArgs),
}
