//! Latency chart engine.
//!
//! Turns a batch of irregular probe records into a fixed-cadence series
//! aligned to the current time, plus the downtime zones derived from it.
//! Everything here is a pure function of `(probes, range, now)`.

mod models;
mod range;
mod resample;
mod zones;

pub use models::*;
pub use range::*;
pub use resample::*;
pub use zones::*;

use chrono::{DateTime, Utc};

/// Resample `probes` for `range` and derive its downtime zones.
pub fn build_chart(probes: &[ProbeRecord], range: RangeSelector, now: DateTime<Utc>) -> ChartPayload {
    let buckets = resample(probes, range, now);
    let zones = extract_zones(&buckets);

    ChartPayload {
        range,
        start: now - range.policy().lookback(),
        end: now,
        buckets,
        zones,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_build_chart_empty() {
        let chart = build_chart(&[], RangeSelector::OneHour, now());
        assert_eq!(chart.buckets.len(), 61);
        assert!(chart.zones.is_empty());
        assert_eq!(chart.start, now() - ChronoDuration::hours(1));
        assert_eq!(chart.end, now());
    }

    #[test]
    fn test_build_chart_is_deterministic() {
        let probes = vec![
            ProbeRecord::success(now() - ChronoDuration::minutes(45), 12.0),
            ProbeRecord::failure(now() - ChronoDuration::minutes(44)),
            ProbeRecord::failure(now() - ChronoDuration::minutes(43)),
            ProbeRecord::success(now() - ChronoDuration::minutes(42), 15.0),
        ];

        let a = build_chart(&probes, RangeSelector::OneHour, now());
        let b = build_chart(&probes, RangeSelector::OneHour, now());
        assert_eq!(a, b);
        assert_eq!(
            a.zones,
            vec![DowntimeZone {
                start: now() - ChronoDuration::minutes(44),
                end: now() - ChronoDuration::minutes(43),
            }]
        );
    }

    #[test]
    fn test_payload_json_shape() {
        let probes = vec![ProbeRecord::failure(now() - ChronoDuration::hours(2))];
        let chart = build_chart(&probes, RangeSelector::OneDay, now());
        let json = serde_json::to_value(&chart).unwrap();

        assert_eq!(json["range"], "24h");
        assert_eq!(json["end"], now().timestamp_millis());
        assert_eq!(json["buckets"].as_array().map(|b| b.len()), Some(25));
        assert_eq!(json["buckets"][22]["failed"], true);
        assert_eq!(json["zones"][0]["start"], (now() - ChronoDuration::hours(2)).timestamp_millis());
    }
}
