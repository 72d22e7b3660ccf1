//! Re-enrichment freshness check

use chrono::{DateTime, Duration, Utc};

/// Records older than this many days are due for re-enrichment
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Whether a record should be enriched again
///
/// Never-enriched records always qualify. Otherwise a record qualifies once
/// it is at least `max_age` old.
pub fn needs_reenrichment(
    last_enriched_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    max_age: Duration,
) -> bool {
    match last_enriched_at {
        None => true,
        Some(last) => now.signed_duration_since(last) >= max_age,
    }
}
