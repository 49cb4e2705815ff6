//! Range selectors and their (step, lookback) policy table.

use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest lookback a custom policy may use.
pub const MAX_LOOKBACK_DAYS: i64 = 366;

/// Range errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("unknown range selector: {0:?}")]
    Unknown(String),
    #[error("invalid range policy: {0}")]
    InvalidPolicy(String),
}

/// The lookback window requested by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RangeSelector {
    #[default]
    OneHour,
    OneDay,
    SevenDays,
    ThirtyDays,
}

impl RangeSelector {
    pub const ALL: [RangeSelector; 4] = [
        RangeSelector::OneHour,
        RangeSelector::OneDay,
        RangeSelector::SevenDays,
        RangeSelector::ThirtyDays,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeSelector::OneHour => "1h",
            RangeSelector::OneDay => "24h",
            RangeSelector::SevenDays => "7d",
            RangeSelector::ThirtyDays => "30d",
        }
    }

    /// Look up the bucket step and lookback for this range.
    pub fn policy(&self) -> RangePolicy {
        match self {
            RangeSelector::OneHour => RangePolicy::fixed(ChronoDuration::minutes(1), ChronoDuration::hours(1)),
            RangeSelector::OneDay => RangePolicy::fixed(ChronoDuration::hours(1), ChronoDuration::hours(24)),
            RangeSelector::SevenDays => RangePolicy::fixed(ChronoDuration::hours(1), ChronoDuration::days(7)),
            RangeSelector::ThirtyDays => RangePolicy::fixed(ChronoDuration::hours(1), ChronoDuration::days(30)),
        }
    }
}

impl fmt::Display for RangeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangeSelector {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RangeSelector::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| RangeError::Unknown(s.to_string()))
    }
}

impl TryFrom<String> for RangeSelector {
    type Error = RangeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RangeSelector> for String {
    fn from(r: RangeSelector) -> Self {
        r.as_str().to_string()
    }
}

/// Bucket width and total lookback for a chart.
///
/// Both are whole milliseconds and `lookback` is a whole multiple of
/// `step` (at most [`MAX_LOOKBACK_DAYS`] long), so the grid
/// `start, start+step, ..., now` has exactly `lookback/step + 1` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePolicy {
    step: ChronoDuration,
    lookback: ChronoDuration,
}

impl RangePolicy {
    /// Build a custom policy, rejecting steps that do not tile the lookback.
    pub fn new(step: ChronoDuration, lookback: ChronoDuration) -> Result<Self, RangeError> {
        if step <= ChronoDuration::zero() {
            return Err(RangeError::InvalidPolicy("step must be positive".to_string()));
        }
        if lookback < ChronoDuration::zero() {
            return Err(RangeError::InvalidPolicy("lookback cannot be negative".to_string()));
        }

        if lookback > ChronoDuration::days(MAX_LOOKBACK_DAYS) {
            return Err(RangeError::InvalidPolicy(format!(
                "lookback cannot exceed {} days",
                MAX_LOOKBACK_DAYS
            )));
        }
        if !is_whole_millis(step) || !is_whole_millis(lookback) {
            return Err(RangeError::InvalidPolicy(
                "step and lookback must be whole milliseconds".to_string(),
            ));
        }

        let step_ms = step.num_milliseconds();
        if lookback.num_milliseconds() % step_ms != 0 {
            return Err(RangeError::InvalidPolicy(format!(
                "lookback {}s is not a multiple of step {}s",
                lookback.num_seconds(),
                step.num_seconds()
            )));
        }

        Ok(Self { step, lookback })
    }

    fn fixed(step: ChronoDuration, lookback: ChronoDuration) -> Self {
        Self { step, lookback }
    }

    pub fn step(&self) -> ChronoDuration {
        self.step
    }

    pub fn lookback(&self) -> ChronoDuration {
        self.lookback
    }

    /// Number of buckets the resampler emits for this policy.
    pub fn bucket_count(&self) -> usize {
        (self.lookback.num_milliseconds() / self.step.num_milliseconds()) as usize + 1
    }
}

fn is_whole_millis(d: ChronoDuration) -> bool {
    ChronoDuration::milliseconds(d.num_milliseconds()) == d
}
