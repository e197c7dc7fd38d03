//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::BackendError;
use crate::server::handlers::{chat_handler, health_handler, stats_handler, version_handler};
use crate::server::state::ServerState;
use crate::server::ws::ws_handler;

/// Bind the listener and spawn the HTTP server task
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), BackendError>>, BackendError> {
    let app = Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Stats
        .route("/stats", get(stats_handler))
        // Chat
        .route("/chat", post(chat_handler))
        .route("/ws/chat", get(ws_handler))
        // State and middleware
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| BackendError::ServerError(e.to_string()))?;
    info!("HTTP server listening on {}", addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| BackendError::ServerError(e.to_string()))
    });

    Ok(handle)
}
