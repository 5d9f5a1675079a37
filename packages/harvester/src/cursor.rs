//! Per-channel incremental-fetch cursors.
//!
//! Cursors live for the lifetime of the process. A channel that has never
//! been fetched reads as "24 hours ago", so the first sweep picks up the last
//! day of posts.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::clock::{Clock, SystemClock};

/// Lookback applied to channels without a cursor.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// Normalize a configured channel name: trim and strip one leading `@`.
///
/// Returns `None` for entries that are empty after normalization.
pub fn normalize_channel(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let name = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// In-memory map of channel name to last-seen timestamp.
pub struct CursorStore {
    cursors: RwLock<HashMap<String, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl Default for CursorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            cursors: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Stored cursor, or `now - 24h` when the channel has never been fetched.
    pub fn last_fetch(&self, channel: &str) -> DateTime<Utc> {
        let cursors = self.cursors.read().unwrap_or_else(PoisonError::into_inner);
        cursors
            .get(channel)
            .copied()
            .unwrap_or_else(|| self.clock.now() - Duration::hours(DEFAULT_LOOKBACK_HOURS))
    }

    /// Overwrite the cursor. No ordering check is applied.
    pub fn advance(&self, channel: &str, timestamp: DateTime<Utc>) {
        let mut cursors = self.cursors.write().unwrap_or_else(PoisonError::into_inner);
        cursors.insert(channel.to_string(), timestamp);
    }

    /// A message is new only if it is strictly after the cursor.
    pub fn is_new(&self, channel: &str, timestamp: DateTime<Utc>) -> bool {
        timestamp > self.last_fetch(channel)
    }

    pub fn reset_all(&self) {
        let mut cursors = self.cursors.write().unwrap_or_else(PoisonError::into_inner);
        cursors.clear();
    }

    /// Copy of the cursor map keyed `@name`.
    pub fn snapshot(&self) -> BTreeMap<String, DateTime<Utc>> {
        let cursors = self.cursors.read().unwrap_or_else(PoisonError::into_inner);
        cursors
            .iter()
            .map(|(channel, ts)| (format!("@{}", channel), *ts))
            .collect()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedClock;
    use chrono::TimeZone;

    fn store_at(now: DateTime<Utc>) -> CursorStore {
        CursorStore::with_clock(Arc::new(FixedClock::new(now)))
    }

    #[test]
    fn test_unseen_channel_reads_as_one_day_ago() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let store = store_at(now);
        assert_eq!(store.last_fetch("jobs"), now - Duration::hours(24));
    }

    #[test]
    fn test_default_lookback_follows_the_clock() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(now));
        let store = CursorStore::with_clock(clock.clone());
        assert!(store.is_new("jobs", now - Duration::hours(23)));

        let later = now + Duration::hours(6);
        clock.set(later);

        assert_eq!(store.now(), later);
        assert_eq!(store.last_fetch("jobs"), later - Duration::hours(24));
        assert!(!store.is_new("jobs", now - Duration::hours(23)));
    }

    #[test]
    fn test_is_new_is_strict() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let store = store_at(now);
        let cursor = now - Duration::hours(1);
        store.advance("jobs", cursor);

        assert!(!store.is_new("jobs", cursor));
        assert!(store.is_new("jobs", cursor + Duration::seconds(1)));
        assert!(!store.is_new("jobs", cursor - Duration::seconds(1)));
    }

    #[test]
    fn test_advance_overwrites_without_ordering_check() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let store = store_at(now);
        store.advance("jobs", now);
        store.advance("jobs", now - Duration::days(3));
        assert_eq!(store.last_fetch("jobs"), now - Duration::days(3));
    }

    #[test]
    fn test_reset_all_forgets_every_channel() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let store = store_at(now);
        store.advance("a", now);
        store.advance("b", now);

        store.reset_all();

        assert!(store.snapshot().is_empty());
        assert_eq!(store.last_fetch("a"), now - Duration::hours(24));
    }

    #[test]
    fn test_snapshot_prefixes_names() {
        let store = CursorStore::new();
        let ts = Utc::now();
        store.advance("remote_jobs", ts);
        assert_eq!(store.snapshot().get("@remote_jobs"), Some(&ts));
    }

    #[test]
    fn test_normalize_channel() {
        assert_eq!(normalize_channel("  @jobs "), Some("jobs".to_string()));
        assert_eq!(normalize_channel("jobs"), Some("jobs".to_string()));
        assert_eq!(normalize_channel(" @ "), None);
        assert_eq!(normalize_channel(""), None);
    }
}
