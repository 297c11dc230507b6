//! queuewatch Server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - QUEUEWATCH_HOST: Bind address (default: 0.0.0.0)
//! - QUEUEWATCH_PORT: Port number (default: 8080)
//! - RUST_LOG: Log level (default: info)

use queuewatch::api::{run_server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "queuewatch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    tracing::info!("queuewatch configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!("  Version: {}", env!("CARGO_PKG_VERSION"));

    run_server(config).await
}
