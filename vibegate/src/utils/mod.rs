//! Small shared helpers.

pub mod timestamps;

pub use timestamps::{format_iso8601, now_utc, Timestamp};
