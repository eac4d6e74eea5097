// Utility functions for foryou-ranking

use chrono::{DateTime, Utc};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Clamp a percentage into [0, 100]; non-finite input becomes 0.
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Parse an ISO-8601 / RFC 3339 timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw.trim()).map(|dt| dt.with_timezone(&Utc))
}

/// Fractional days between `then` and `now` (negative if `then` is in the future).
pub fn days_between(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - then).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}
