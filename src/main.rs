//! uptrail - serves latency charts for uptime monitors.

use uptrail::clock::SystemClock;
use uptrail::config::ServerConfig;
use uptrail::db::Store;
use uptrail::web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("uptrail=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting uptrail on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);
    tracing::info!("Default chart range: {}", cfg.default_range);

    // Open the probe store written by the prober
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    let server = Server::new(cfg, store, Arc::new(SystemClock));
    server.start().await?;

    Ok(())
}
