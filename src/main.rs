//! SQLite MCP Server - Binary Entry Point
//!
//! Serves the SQLite tools over SSE (default) or stdio, configured from the
//! environment. Logs go to stderr; stdout belongs to the stdio transport.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlite_mcp_bridge::api::{self, SseState};
use sqlite_mcp_bridge::tools::register_all_tools;
use sqlite_mcp_bridge::{Config, McpServer, ServerInfo, SqliteDatabase, TransportType};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::from_env()?;
    info!(
        version = sqlite_mcp_bridge::VERSION,
        transport = %config.transport,
        db_path = %config.database.path.display(),
        "starting SQLite MCP server"
    );

    let db = Arc::new(SqliteDatabase::new(config.database.path.clone()));
    let server_info = ServerInfo::new(
        config.server_name.clone(),
        sqlite_mcp_bridge::VERSION.to_string(),
    );
    let mut server = McpServer::with_info(server_info);
    register_all_tools(&mut server, db);

    match config.transport {
        TransportType::Stdio => {
            tokio::task::spawn_blocking(move || server.run_stdio())
                .await
                .context("stdio transport task failed")??;
        }
        TransportType::Sse => {
            let listener = TcpListener::bind(config.http.bind_address())
                .await
                .with_context(|| format!("failed to bind {}", config.http.bind_address()))?;
            let state = Arc::new(SseState::new(server).with_keep_alive(config.http.keep_alive));
            api::serve(listener, state, &config.http, api::shutdown_signal()).await?;
        }
    }

    info!("server shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber with stderr output.
fn init_logging() {
    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn,sqlite_mcp_bridge=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
