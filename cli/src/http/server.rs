use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::http::{
    middleware::{create_middleware_stack, create_trace_layer, request_logger},
    routes::create_router,
    AppState,
};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            request_timeout_secs: 300,
        }
    }
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn start_server_with_config(
    config: ServerConfig,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, &config, state, shutdown_signal()).await
}

fn build_app(config: &ServerConfig, state: AppState) -> Router {
    create_router(state)
        .layer(middleware::from_fn(request_logger))
        .layer(create_trace_layer())
        .layer(create_middleware_stack(Duration::from_secs(
            config.request_timeout_secs,
        )))
}

async fn serve<F>(
    listener: TcpListener,
    config: &ServerConfig,
    state: AppState,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let session_id = state.session_id.clone();
    let app = build_app(config, state);

    info!(
        target: "kiln.http",
        session_id = %session_id,
        "HTTP server listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!(target: "kiln.http", "Starting graceful shutdown...");
        })
        .await?;

    info!(target: "kiln.http", "Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!(target: "kiln.http", "Received Ctrl+C signal");
        }
        _ = wait_for_sigterm() => {
            info!(target: "kiln.http", "Received SIGTERM signal");
        }
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(target: "kiln.http", error = %e, "cannot install SIGTERM handler");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
