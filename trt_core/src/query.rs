//! Shared ordering and filtering helpers over the entry log.
//!
//! The projector and the aggregator both answer "most recent" and
//! "within N days" questions; routing them through these helpers keeps the
//! ordering semantics identical everywhere. All helpers return new
//! sequences and never mutate their inputs.

use crate::types::{Entry, EventType};
use chrono::{DateTime, Duration, Utc};

/// Sort entries reverse-chronologically (newest first).
///
/// Ties on `date` break on `id` descending so the result is stable across
/// runs regardless of insertion order.
pub fn sort_by_date_desc(entries: &[Entry]) -> Vec<Entry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    sorted
}

/// Entries dated within the trailing `days`-day window ending at `now`.
///
/// The lower bound `now - days` is inclusive.
pub fn within_days(entries: &[Entry], now: DateTime<Utc>, days: i64) -> Vec<Entry> {
    let cutoff = now - Duration::days(days);
    entries
        .iter()
        .filter(|entry| entry.date >= cutoff)
        .cloned()
        .collect()
}

/// Entries of a single event type
pub fn of_type(entries: &[Entry], event_type: EventType) -> Vec<Entry> {
    entries
        .iter()
        .filter(|entry| entry.event_type == event_type)
        .cloned()
        .collect()
}

/// Signed whole-calendar-day difference from `from` to `to`.
///
/// Calendar days, not elapsed 24-hour blocks: two instants on the same
/// calendar date are 0 days apart regardless of their time of day, so
/// overdue flags and day counts round consistently.
pub fn calendar_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    to.date_naive().signed_duration_since(from.date_naive()).num_days()
}
