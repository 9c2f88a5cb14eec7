//! TTL + bounded-size cache for statistics snapshots.
//!
//! The cache is an explicitly constructed, injectable object owned by the
//! engine (never a process-wide singleton) so tests can instantiate isolated
//! instances. It holds at most one entry per scope key and at most
//! `capacity` entries total; inserting a new key at capacity evicts the
//! globally oldest entry by creation timestamp. Staleness never auto-evicts —
//! it only makes `get_if_fresh` miss, which triggers recomputation upstream.
//!
//! Timestamps are passed in by the caller so tests can drive the clock.

use crate::stats::snapshot::StatisticsSnapshot;
use crate::types::ScopeKey;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// One cached snapshot with its creation timestamp.
#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Arc<StatisticsSnapshot>,
    created_at: DateTime<Utc>,
}

/// Bounded, time-expiring snapshot cache keyed by scope.
#[derive(Debug)]
pub struct SnapshotCache {
    entries: HashMap<ScopeKey, CacheEntry>,
    capacity: usize,
    ttl: Duration,
}

impl SnapshotCache {
    /// Create a cache holding up to `capacity` snapshots that stay fresh for
    /// `ttl_secs` seconds.
    pub fn new(capacity: usize, ttl_secs: u64) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Return the cached snapshot for `key` if present and not stale.
    ///
    /// An entry is stale once `now - created_at > ttl`. Stale entries are
    /// left in place; they are overwritten by the recomputation that follows
    /// a miss.
    pub fn get_if_fresh(
        &self,
        key: &ScopeKey,
        now: DateTime<Utc>,
    ) -> Option<Arc<StatisticsSnapshot>> {
        let entry = self.entries.get(key)?;
        if now - entry.created_at > self.ttl {
            tracing::debug!(scope = %key, "Cached snapshot is stale");
            return None;
        }
        Some(Arc::clone(&entry.snapshot))
    }

    /// Insert (or overwrite) the snapshot for `key` with timestamp `now`.
    ///
    /// Eviction and insertion happen together so the size invariant holds at
    /// every point the lock is released.
    pub fn insert(&mut self, key: ScopeKey, snapshot: Arc<StatisticsSnapshot>, now: DateTime<Utc>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| *k);
            if let Some(oldest) = oldest {
                tracing::debug!(scope = %oldest, "Evicting oldest cached snapshot");
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                snapshot,
                created_at: now,
            },
        );
    }

    /// Number of cached snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilmFilter;

    fn snapshot(scope: ScopeKey) -> Arc<StatisticsSnapshot> {
        Arc::new(StatisticsSnapshot::empty(scope))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_ttl_boundary() {
        let mut cache = SnapshotCache::new(5, 600);
        let key = ScopeKey::all_time(FilmFilter::All);
        cache.insert(key, snapshot(key), at(0));

        // 599s: still fresh; 601s: stale but not evicted
        assert!(cache.get_if_fresh(&key, at(599)).is_some());
        assert!(cache.get_if_fresh(&key, at(600)).is_some());
        assert!(cache.get_if_fresh(&key, at(601)).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_globally_oldest() {
        let mut cache = SnapshotCache::new(5, 600);
        for (i, year) in (2019..2024).enumerate() {
            let key = ScopeKey::year(year, FilmFilter::All);
            cache.insert(key, snapshot(key), at(i as i64));
        }
        assert_eq!(cache.len(), 5);

        // A 6th distinct key evicts exactly the oldest entry
        let newest = ScopeKey::year(2024, FilmFilter::All);
        cache.insert(newest, snapshot(newest), at(100));
        assert_eq!(cache.len(), 5);

        let oldest = ScopeKey::year(2019, FilmFilter::All);
        assert!(cache.get_if_fresh(&oldest, at(100)).is_none());
        for year in 2020..2025 {
            let key = ScopeKey::year(year, FilmFilter::All);
            assert!(cache.get_if_fresh(&key, at(100)).is_some(), "{year} missing");
        }
    }

    #[test]
    fn test_overwrite_same_key_does_not_evict() {
        let mut cache = SnapshotCache::new(2, 600);
        let a = ScopeKey::year(2023, FilmFilter::All);
        let b = ScopeKey::year(2024, FilmFilter::All);
        cache.insert(a, snapshot(a), at(0));
        cache.insert(b, snapshot(b), at(1));

        // Overwriting refreshes the timestamp without evicting anyone
        cache.insert(a, snapshot(a), at(700));
        assert_eq!(cache.len(), 2);
        assert!(cache.get_if_fresh(&a, at(800)).is_some());
        assert!(cache.get_if_fresh(&b, at(500)).is_some());
    }

    #[test]
    fn test_stale_entry_can_be_overwritten() {
        let mut cache = SnapshotCache::new(5, 600);
        let key = ScopeKey::all_time(FilmFilter::Short);
        cache.insert(key, snapshot(key), at(0));
        assert!(cache.get_if_fresh(&key, at(1000)).is_none());

        cache.insert(key, snapshot(key), at(1000));
        assert!(cache.get_if_fresh(&key, at(1100)).is_some());
    }

    #[test]
    fn test_clear() {
        let mut cache = SnapshotCache::new(5, 600);
        let key = ScopeKey::all_time(FilmFilter::All);
        cache.insert(key, snapshot(key), at(0));
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
