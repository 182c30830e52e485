//! Time helpers.
//!
//! Timestamps cross the transport as epoch milliseconds in an `f64`, the way
//! the page clock reports them.

use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> f64 {
    Utc::now().timestamp_millis() as f64
}

/// ISO-8601 rendering of an epoch-millisecond instant (`2024-01-01T00:00:00.000Z`).
///
/// Returns `None` when the instant is outside the representable range.
pub fn iso_string(millis: f64) -> Option<String> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Local `HH:MM:SS.mmm` display string for an entry timestamp.
pub fn display_time(millis: f64) -> String {
    if !millis.is_finite() {
        return String::from("--:--:--.---");
    }
    match Local.timestamp_millis_opt(millis as i64).single() {
        Some(dt) => dt.format("%H:%M:%S%.3f").to_string(),
        None => String::from("--:--:--.---"),
    }
}
