//! The statistics engine: composition root wiring source, directory, working
//! sets and the snapshot cache together.
//!
//! `get_or_compute` is the engine's whole contract: return a fresh cached
//! snapshot when one exists, otherwise recompute against the current enriched
//! working set for the scope's filter and publish the result. A force refresh
//! additionally drops the filter-level working sets so new upstream data is
//! guaranteed to be re-fetched, not just re-derived.

use crate::cache::SnapshotCache;
use crate::config::StatsConfig;
use crate::error::Result;
use crate::stats::enrich::{normalize_filtered, EnrichedEntry};
use crate::stats::snapshot::{build_snapshot, scope_entries, StatisticsSnapshot};
use crate::types::{FilmFilter, LocationDirectory, ScopeKey, WatchLogSource};
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Local watch-log analytics engine.
///
/// The cache map and the working-set map are the only mutable shared state;
/// both sit behind async mutexes so writes are serialized while snapshot
/// computation itself runs lock-free over immutable `Arc`'d entry sets.
/// Across concurrent calls the last write to a scope key wins; no stronger
/// consistency is provided.
pub struct StatsEngine<S, D> {
    source: S,
    directory: D,
    config: StatsConfig,
    cache: Mutex<SnapshotCache>,
    working_sets: Mutex<HashMap<FilmFilter, Arc<Vec<EnrichedEntry>>>>,
}

impl<S, D> StatsEngine<S, D>
where
    S: WatchLogSource,
    D: LocationDirectory,
{
    /// Create an engine over a watch-log source and a location directory.
    pub fn new(source: S, directory: D, config: StatsConfig) -> Result<Self> {
        config.validate()?;
        let cache = SnapshotCache::new(config.cache_capacity, config.cache_ttl_secs);
        Ok(Self {
            source,
            directory,
            config,
            cache: Mutex::new(cache),
            working_sets: Mutex::new(HashMap::new()),
        })
    }

    /// Return the snapshot for `scope`, computing it if needed.
    ///
    /// With `force` false, a non-stale cached snapshot is returned without
    /// recomputation. Otherwise the scope is recomputed from the current
    /// working set and stored with a fresh timestamp, evicting the globally
    /// oldest entry first when the cache is full. With `force` true the
    /// filter-level working sets are invalidated first, so the raw log is
    /// re-fetched from the source.
    ///
    /// On upstream failure the error is surfaced as-is; callers are expected
    /// to fall back to a previously obtained snapshot or to
    /// [`StatisticsSnapshot::empty`].
    pub async fn get_or_compute(
        &self,
        scope: ScopeKey,
        force: bool,
    ) -> Result<Arc<StatisticsSnapshot>> {
        self.get_or_compute_at(scope, force, Utc::now(), Local::now().date_naive())
            .await
    }

    /// Clock-injected variant of [`get_or_compute`](Self::get_or_compute).
    ///
    /// `now` drives cache freshness and the stored timestamp; `today` anchors
    /// the date-relative statistics (streak activity, pace, decades).
    pub async fn get_or_compute_at(
        &self,
        scope: ScopeKey,
        force: bool,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<Arc<StatisticsSnapshot>> {
        if force {
            tracing::info!(scope = %scope, "Force refresh, dropping working sets");
            self.working_sets.lock().await.clear();
        } else if let Some(snapshot) = self.cache.lock().await.get_if_fresh(&scope, now) {
            tracing::debug!(scope = %scope, "Using cached snapshot");
            return Ok(snapshot);
        }

        tracing::info!(scope = %scope, force, "Computing statistics snapshot");

        let working_set = self.working_set(scope.filter).await?;
        let scoped = scope_entries(&working_set, &scope);

        let snapshot = Arc::new(
            build_snapshot(
                scoped,
                working_set,
                scope,
                today,
                &self.directory,
                &self.config,
            )
            .await?,
        );

        // Evict-then-insert happens atomically under the cache lock
        self.cache
            .lock()
            .await
            .insert(scope, Arc::clone(&snapshot), now);

        Ok(snapshot)
    }

    /// Force-refresh the snapshot for `scope`, re-fetching upstream data.
    pub async fn refresh(&self, scope: ScopeKey) -> Result<Arc<StatisticsSnapshot>> {
        self.get_or_compute(scope, true).await
    }

    /// Enriched working set for a filter, building it on first use.
    ///
    /// Held under the mutex for the whole fetch so concurrent callers never
    /// trigger duplicate upstream fetches for the same filter.
    async fn working_set(&self, filter: FilmFilter) -> Result<Arc<Vec<EnrichedEntry>>> {
        let mut sets = self.working_sets.lock().await;
        if let Some(set) = sets.get(&filter) {
            return Ok(Arc::clone(set));
        }

        let raw = self.source.fetch_entries().await?;
        let enriched = Arc::new(normalize_filtered(&raw, filter));
        tracing::debug!(
            filter = filter.as_str(),
            raw = raw.len(),
            enriched = enriched.len(),
            "Built enriched working set"
        );
        sets.insert(filter, Arc::clone(&enriched));
        Ok(enriched)
    }
}
