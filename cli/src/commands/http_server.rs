use kiln_core::api::AppContext;
use uuid::Uuid;

use crate::error::CliError;
use crate::http::{server, server::ServerConfig, AppState};

pub async fn handle_serve(ctx: AppContext) -> Result<(), CliError> {
    let session_id = Uuid::new_v4().to_string();

    let http = &ctx.cfg().http_server;
    let config = ServerConfig {
        host: http.host.clone(),
        port: http.port,
        request_timeout_secs: http.request_timeout_secs,
    };

    let state = AppState::new(session_id, ctx);
    server::start_server_with_config(config, state)
        .await
        .map_err(|e| CliError::Server(e.to_string()))
}
