//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::sse::handler::{health_handler, messages_handler, root_handler, sse_handler};
use super::sse::SseState;
use crate::config::HttpConfig;
use crate::constants::{MESSAGES_PATH, SSE_PATH};
use crate::error::McpResult;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<SseState>, config: &HttpConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(SSE_PATH, get(sse_handler))
        .route(MESSAGES_PATH, post(messages_handler))
        .with_state(state);

    if config.enable_cors {
        // Allow all origins: browser-based MCP inspectors connect cross-origin
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    if config.enable_tracing {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

/// Serve `state` on an already bound listener until `shutdown` resolves.
///
/// Open event streams are closed when shutdown starts so the graceful drain
/// does not wait on them forever.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<SseState>,
    config: &HttpConfig,
    shutdown: F,
) -> McpResult<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    let app = create_router(state.clone(), config);

    info!("HTTP server listening on http://{}", addr);
    info!("SSE endpoint: http://{}{}", addr, SSE_PATH);
    info!("Messages endpoint: http://{}{}", addr, MESSAGES_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let closed = state.sessions.close_all();
            info!(closed, "shutting down, closed event streams");
        })
        .await?;

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
