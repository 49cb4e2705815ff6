//! Resampler: irregular probe records onto a fixed-step grid ending at `now`.

use super::models::{Bucket, BucketState, ProbeRecord};
use super::range::{RangePolicy, RangeSelector};

use chrono::{DateTime, Utc};

/// Resample `probes` into the grid for `range`, ending at `now`.
pub fn resample(probes: &[ProbeRecord], range: RangeSelector, now: DateTime<Utc>) -> Vec<Bucket> {
    resample_with_policy(probes, range.policy(), now)
}

/// Resample against an explicit policy.
///
/// Buckets cover `[t, t+step)` for `t = now - lookback, ..., now`; the last
/// window is cut off at `now`, so probes at or after `now` are never counted.
pub fn resample_with_policy(
    probes: &[ProbeRecord],
    policy: RangePolicy,
    now: DateTime<Utc>,
) -> Vec<Bucket> {
    let step = policy.step();
    let start = now - policy.lookback();

    let mut malformed = 0usize;
    let mut sorted: Vec<&ProbeRecord> = probes
        .iter()
        .filter(|p| {
            if p.is_malformed() {
                malformed += 1;
                false
            } else {
                true
            }
        })
        .collect();
    sorted.sort_by_key(|p| p.timestamp);

    if malformed > 0 {
        tracing::warn!("Resampler: Dropped {} malformed probe records", malformed);
    }

    let mut buckets = Vec::with_capacity(policy.bucket_count());
    let mut cursor = 0;
    let mut t = start;

    while t <= now {
        let window_end = (t + step).min(now);

        // Anything before this window is out of range (only happens before `start`).
        while cursor < sorted.len() && sorted[cursor].timestamp < t {
            cursor += 1;
        }

        let mut window = WindowStats::default();
        while cursor < sorted.len() && sorted[cursor].timestamp < window_end {
            window.add(sorted[cursor]);
            cursor += 1;
        }

        buckets.push(Bucket::new(t, window.classify()));
        t += step;
    }

    tracing::debug!(
        "Resampler: {} probes into {} buckets (step={}s)",
        sorted.len(),
        buckets.len(),
        step.num_seconds()
    );

    buckets
}

#[derive(Default)]
struct WindowStats {
    seen: usize,
    sum: f64,
    values: usize,
}

impl WindowStats {
    fn add(&mut self, probe: &ProbeRecord) {
        self.seen += 1;
        if let Some(latency) = probe.usable_latency() {
            self.sum += latency;
            self.values += 1;
        }
    }

    fn classify(&self) -> BucketState {
        if self.values > 0 {
            BucketState::Value((self.sum / self.values as f64).round() as u64)
        } else if self.seen > 0 {
            BucketState::AllFailed
        } else {
            BucketState::NoData
        }
    }
}
