//! Web server module.

mod handlers;

pub use handlers::*;

use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::source::ProbeSource;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub source: Arc<dyn ProbeSource>,
    pub clock: Arc<dyn Clock>,
}

/// Web server serving chart payloads.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ServerConfig, source: Arc<dyn ProbeSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: AppState {
                config,
                source,
                clock,
            },
        }
    }

    /// Build the router with all routes.
    pub fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            .route("/api/monitors/{id}/latency", get(handlers::handle_get_latency))
            .route("/api/ranges", get(handlers::handle_get_ranges))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
