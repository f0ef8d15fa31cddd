use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

const API_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The `[now - N days, now]` window shared by every daily-values batch of a run.
///
/// Formats as `start/end` in UTC with second precision, which is the interval
/// syntax the USGS `time` query parameter expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Window of `days` days ending now.
    pub fn last_days(days: u32) -> Self {
        Self::ending_at(Utc::now(), days)
    }

    pub fn ending_at(end: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: end - TimeDelta::days(i64::from(days)),
            end,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format(API_TIMESTAMP_FORMAT),
            self.end.format(API_TIMESTAMP_FORMAT)
        )
    }
}
