//! Alert drill against a running queuewatch server
//!
//! Run with: cargo run --bin drill
//!
//! Environment variables:
//! - QUEUEWATCH_URL: Server base URL (default: http://127.0.0.1:8080)
//! - QUEUEWATCH_TRIGGER: Trigger used by every scenario (default: 10)
//! - QUEUEWATCH_SETTLE_MS: Pause after each post/delete (default: 1000)
//! - QUEUEWATCH_PREFIX: Prefix for scenario queue names (default: none)
//! - RUST_LOG: Log level (default: info)

use std::time::{Duration, Instant};

use queuewatch::client::{HttpBackend, QueueClient};
use queuewatch::drill::{Drill, DrillConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "queuewatch=info,drill=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let url = std::env::var("QUEUEWATCH_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".into());
    let config = DrillConfig::from_env();

    let backend = HttpBackend::try_with_timeout(url.clone(), Duration::from_secs(30))?;
    if !backend.health_check().await? {
        return Err(format!("Server at {} is not healthy", url).into());
    }

    println!("=== queuewatch alert drill ===");
    println!("Server:  {}", url);
    println!("Trigger: {}", config.trigger);
    println!("Settle:  {:?}", config.settle);
    println!();

    let start = Instant::now();
    let mut drill = Drill::new(QueueClient::new(backend), config);

    match drill.run_all().await {
        Ok(report) => {
            println!(
                "PASS: {} scenarios, {} checks in {:.1}s",
                report.scenarios,
                report.checks,
                start.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            println!("FAIL after {} checks: {}", drill.checks(), e);
            Err(e.into())
        }
    }
}
