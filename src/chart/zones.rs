//! Downtime zone extraction from a resampled series.

use super::models::{Bucket, DowntimeZone};

use chrono::{DateTime, Utc};

/// Merge runs of consecutive all-failed buckets into zones.
///
/// A zone ends at the last failed bucket's timestamp, so a lone failed
/// bucket yields `start == end`. No-data buckets close an open zone.
pub fn extract_zones(buckets: &[Bucket]) -> Vec<DowntimeZone> {
    let mut zones = Vec::new();
    let mut open: Option<DateTime<Utc>> = None;

    for (i, bucket) in buckets.iter().enumerate() {
        match (bucket.is_all_failed(), open) {
            (true, None) => open = Some(bucket.timestamp),
            (false, Some(start)) => {
                zones.push(DowntimeZone {
                    start,
                    end: buckets[i - 1].timestamp,
                });
                open = None;
            }
            _ => {}
        }
    }

    if let (Some(start), Some(last)) = (open, buckets.last()) {
        zones.push(DowntimeZone {
            start,
            end: last.timestamp,
        });
    }

    zones
}
