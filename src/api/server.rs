use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    add_alert, clear_queue, delete_message, delete_queue, health_check, list_alerts, list_queues,
    post_messages, queue_info, release_message, reserve_messages, take_messages, AppState,
};
use crate::storage::QueueStore;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the environment
    /// QUEUEWATCH_HOST=0.0.0.0
    /// QUEUEWATCH_PORT=8080
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("QUEUEWATCH_HOST").unwrap_or(defaults.host);
        let port = std::env::var("QUEUEWATCH_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        Self { host, port }
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Queue management
        .route("/queues", get(list_queues))
        .route("/queues/:name", get(queue_info).delete(delete_queue))
        .route("/queues/:name/clear", post(clear_queue))
        // Messages
        .route(
            "/queues/:name/messages",
            post(post_messages)
                .get(reserve_messages)
                .delete(take_messages),
        )
        .route("/queues/:name/messages/:id", delete(delete_message))
        .route("/queues/:name/messages/:id/release", post(release_message))
        // Alerts
        .route("/queues/:name/alerts", get(list_alerts).post(add_alert))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server until Ctrl+C
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState {
        store: Arc::new(QueueStore::new()),
    });
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting queuewatch server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("queuewatch server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
