//! Timestamp helpers.
//!
//! All timestamps are UTC. The string form is ISO 8601 with microsecond
//! precision and an explicit `+00:00` offset, which is what zone snapshots
//! and collision details print.

use chrono::{DateTime, Utc};

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Formats a timestamp as ISO 8601 string.
///
/// # Examples
///
/// ```
/// use vibegate::utils::{format_iso8601, now_utc};
///
/// let ts = format_iso8601(&now_utc());
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with("+00:00"));
/// ```
#[must_use]
pub fn format_iso8601(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}
