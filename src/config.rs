//! Configuration module for uptrail.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::chart::RangeSelector;

use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 9096)
    pub http_port: u16,
    /// Path to the SQLite probe database (default: "uptrail.db")
    pub db_path: String,
    /// Upper bound on fetching probes for one chart request (default: 10s)
    pub fetch_timeout: Duration,
    /// Range used when a request names none (default: 1h)
    pub default_range: RangeSelector,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 9096,
            db_path: "uptrail.db".to_string(),
            fetch_timeout: Duration::from_secs(10),
            default_range: RangeSelector::OneHour,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `UPTRAIL_HTTP_PORT`: HTTP port (default: 9096)
    /// - `UPTRAIL_DB_PATH`: Database file path (default: "uptrail.db")
    /// - `UPTRAIL_FETCH_TIMEOUT_SECS`: Probe fetch timeout in seconds (default: 10)
    /// - `UPTRAIL_DEFAULT_RANGE`: One of 1h, 24h, 7d, 30d (default: 1h)
    pub fn load() -> Self {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Unparseable values
    /// keep their defaults.
    pub fn load_from<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = lookup("UPTRAIL_HTTP_PORT").and_then(|s| s.parse().ok()) {
            cfg.http_port = port;
        }

        if let Some(db_path) = lookup("UPTRAIL_DB_PATH").filter(|s| !s.is_empty()) {
            cfg.db_path = db_path;
        }

        if let Some(secs) = lookup("UPTRAIL_FETCH_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
        {
            cfg.fetch_timeout = Duration::from_secs(secs);
        }

        if let Some(value) = lookup("UPTRAIL_DEFAULT_RANGE") {
            match value.parse() {
                Ok(range) => cfg.default_range = range,
                Err(e) => tracing::warn!("Ignoring UPTRAIL_DEFAULT_RANGE: {}", e),
            }
        }

        cfg
    }
}
