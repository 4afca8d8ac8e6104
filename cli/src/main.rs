use clap::Parser;

mod commands;
mod error;
mod http;
mod logging;

use commands::cli::{self, Commands};
use error::CliError;
use kiln_core::api::AppContext;
use kiln_core::config;
use kiln_plugins::PluginServicesFactory;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let args = cli::Args::parse();

    let mut cfg = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::load_default()?,
    };
    if let Commands::Serve(serve) = &args.command {
        serve.apply(&mut cfg);
    }

    let log_guard = logging::init_logging(&cfg.logging)?;

    let ctx = AppContext::new(cfg, &PluginServicesFactory).map_err(CliError::Services)?;

    match args.command {
        Commands::Serve(_) => commands::http_server::handle_serve(ctx).await,
        Commands::Exec(exec) => {
            let code = commands::exec::handle_exec(exec, &ctx).await?;
            drop(log_guard);
            std::process::exit(code);
        }
    }
}
