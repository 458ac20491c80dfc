//! Lazy phase deadlines.
//!
//! No timer ever fires on its own. Any client may ask to advance a phase;
//! the request is honored once the stored deadline has passed.

use chrono::{DateTime, Utc};

/// Whether the phase that ends at `round_end_time` is over at `now`.
///
/// A phase without a deadline never expires.
#[must_use]
pub fn is_expired(now: DateTime<Utc>, round_end_time: Option<DateTime<Utc>>) -> bool {
    round_end_time.is_some_and(|end| now >= end)
}
