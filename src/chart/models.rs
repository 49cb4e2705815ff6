//! Chart input and output types.

use super::RangeSelector;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single timed health-check result, as produced by the prober.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRecord {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Latency in milliseconds; only meaningful when `failed` is false.
    #[serde(default)]
    pub latency_ms: Option<f64>,
    #[serde(default)]
    pub failed: bool,
}

impl ProbeRecord {
    pub fn success(timestamp: DateTime<Utc>, latency_ms: f64) -> Self {
        Self {
            timestamp,
            latency_ms: Some(latency_ms),
            failed: false,
        }
    }

    pub fn failure(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            latency_ms: None,
            failed: true,
        }
    }

    /// Latency usable for averaging. `failed` wins over any stale latency.
    pub fn usable_latency(&self) -> Option<f64> {
        if self.failed {
            return None;
        }
        self.latency_ms.filter(|l| l.is_finite() && *l >= 0.0)
    }

    /// A successful probe whose latency is negative or not a number.
    pub fn is_malformed(&self) -> bool {
        !self.failed && matches!(self.latency_ms, Some(l) if !l.is_finite() || l < 0.0)
    }
}

/// Classification of one output bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketState {
    /// Nothing was probed in this window.
    NoData,
    /// At least one probe ran and none succeeded.
    AllFailed,
    /// Rounded mean latency (ms) of the successful probes.
    Value(u64),
}

/// One fixed-width slot of the resampled series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "BucketWire")]
pub struct Bucket {
    pub timestamp: DateTime<Utc>,
    pub state: BucketState,
}

impl Bucket {
    pub fn new(timestamp: DateTime<Utc>, state: BucketState) -> Self {
        Self { timestamp, state }
    }

    pub fn latency_ms(&self) -> Option<u64> {
        match self.state {
            BucketState::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_all_failed(&self) -> bool {
        self.state == BucketState::AllFailed
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BucketWire {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    latency_ms: Option<u64>,
    failed: bool,
}

impl From<Bucket> for BucketWire {
    fn from(b: Bucket) -> Self {
        Self {
            timestamp: b.timestamp,
            latency_ms: b.latency_ms(),
            failed: b.is_all_failed(),
        }
    }
}

/// A maximal run of consecutive all-failed buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DowntimeZone {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
}

/// Everything the renderer needs for one monitor chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    pub range: RangeSelector,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
    pub buckets: Vec<Bucket>,
    pub zones: Vec<DowntimeZone>,
}
