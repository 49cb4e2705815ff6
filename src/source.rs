//! Probe source interface consumed by the chart endpoint.

use crate::chart::ProbeRecord;
use crate::db::DbError;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Probe source errors.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("unknown monitor: {0}")]
    UnknownMonitor(String),
    #[error("store error: {0}")]
    Store(#[from] DbError),
}

/// Anything that can return the probe records of a monitor for a time window.
pub trait ProbeSource: Send + Sync {
    /// Probe records of `monitor_id` with `start <= timestamp <= end`.
    fn fetch_probes(
        &self,
        monitor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProbeRecord>, SourceError>;
}
