//! The statistics snapshot and its parallel builder.
//!
//! A snapshot is the engine's only output: one immutable, internally
//! consistent bundle of every derived statistic for a scope. The builder
//! fans the pure aggregations out as tasks over the same `Arc`'d entry set
//! and joins *all* of them before assembling — a barrier, not a pipeline, so
//! partial snapshots are never published.

use crate::config::StatsConfig;
use crate::error::{Error, Result};
use crate::stats::distributions::{
    self, DayOfWeekPattern, DecadeBucket, DetailedRatingHistogram, MonthlyCount, RatingHistogram,
    RatingStats, RuntimeStats, WatchSpan, WeeklyCount, YearCount, YearlyCount,
};
use crate::stats::enrich::EnrichedEntry;
use crate::stats::locations::{self, LocationReport};
use crate::stats::pace::{self, PaceReport};
use crate::stats::rewatch::{self, BestRatedMonth, BusiestDay, RewatchStats, TopWatchedFilm};
use crate::stats::streaks::{self, StreakStats};
use crate::types::{LocationDirectory, ScopeKey, YearScope};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// All derived statistics for one scope.
///
/// Immutable once built; consumers treat it as read-only and a new scope
/// selection always produces a new snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSnapshot {
    pub scope: ScopeKey,
    /// Raw entry count in scope
    pub entry_count: usize,
    /// Distinct unique-film keys in scope
    pub unique_films: usize,
    pub rating_histogram: RatingHistogram,
    pub detailed_rating_histogram: DetailedRatingHistogram,
    pub decade_histogram: Vec<DecadeBucket>,
    pub release_years: Vec<YearCount>,
    pub films_per_year: Vec<YearlyCount>,
    pub films_per_month: Vec<MonthlyCount>,
    /// Year-scoped statistic; empty for the all-time scope
    pub weekly_films: Vec<WeeklyCount>,
    pub day_of_week: DayOfWeekPattern,
    pub runtime: RuntimeStats,
    pub watch_span: WatchSpan,
    pub rating_stats: RatingStats,
    pub streaks: StreakStats,
    pub pace: PaceReport,
    pub rewatches: RewatchStats,
    pub top_watched: Vec<TopWatchedFilm>,
    pub busiest_days: Vec<BusiestDay>,
    pub best_rated_months: Vec<BestRatedMonth>,
    pub locations: LocationReport,
    /// When this snapshot was computed
    pub computed_at: DateTime<Utc>,
}

impl StatisticsSnapshot {
    /// All-zero/empty snapshot, the fallback when upstream data is
    /// unavailable and nothing cached exists.
    pub fn empty(scope: ScopeKey) -> Self {
        Self {
            scope,
            entry_count: 0,
            unique_films: 0,
            rating_histogram: RatingHistogram::default(),
            detailed_rating_histogram: DetailedRatingHistogram::default(),
            decade_histogram: Vec::new(),
            release_years: Vec::new(),
            films_per_year: Vec::new(),
            films_per_month: Vec::new(),
            weekly_films: Vec::new(),
            day_of_week: DayOfWeekPattern::default(),
            runtime: RuntimeStats::default(),
            watch_span: WatchSpan::default(),
            rating_stats: RatingStats::default(),
            streaks: StreakStats::default(),
            pace: PaceReport::Empty,
            rewatches: RewatchStats::default(),
            top_watched: Vec::new(),
            busiest_days: Vec::new(),
            best_rated_months: Vec::new(),
            locations: LocationReport::default(),
            computed_at: Utc::now(),
        }
    }
}

/// Restrict a working set to the scope's year selection.
pub fn scope_entries(working_set: &Arc<Vec<EnrichedEntry>>, scope: &ScopeKey) -> Arc<Vec<EnrichedEntry>> {
    match scope.year {
        YearScope::AllTime => Arc::clone(working_set),
        YearScope::Year(y) => Arc::new(
            working_set
                .iter()
                .filter(|e| e.watch_year == y)
                .cloned()
                .collect(),
        ),
    }
}

/// Compute a full snapshot for one scope.
///
/// `scoped` holds the entries in scope, `history` the full multi-year set for
/// the same filter (the pace baseline needs it). The pure aggregations run as
/// spawned tasks concurrently with the location directory lookup; the
/// snapshot is assembled only once every task has joined.
pub async fn build_snapshot(
    scoped: Arc<Vec<EnrichedEntry>>,
    history: Arc<Vec<EnrichedEntry>>,
    scope: ScopeKey,
    today: NaiveDate,
    directory: &dyn LocationDirectory,
    config: &StatsConfig,
) -> Result<StatisticsSnapshot> {
    tracing::debug!(scope = %scope, entries = scoped.len(), "Building statistics snapshot");

    let entries = Arc::clone(&scoped);
    let ratings_task = tokio::task::spawn(async move {
        (
            distributions::rating_histogram(&entries),
            distributions::detailed_rating_histogram(&entries),
            distributions::rating_stats(&entries),
            distributions::decade_histogram(&entries, today),
            distributions::release_year_counts(&entries),
        )
    });

    let entries = Arc::clone(&scoped);
    let year_scope = scope.year;
    let calendar_task = tokio::task::spawn(async move {
        let weekly = match year_scope {
            YearScope::Year(_) => distributions::weekly_films(&entries),
            YearScope::AllTime => Vec::new(),
        };
        (
            distributions::films_per_year(&entries),
            distributions::films_per_month(&entries),
            weekly,
            distributions::day_of_week_pattern(&entries),
            distributions::runtime_stats(&entries),
            distributions::watch_span(&entries),
            streaks::streak_stats(&entries, today),
        )
    });

    let entries = Arc::clone(&scoped);
    let all_years = Arc::clone(&history);
    let top_limit = config.top_watched_limit;
    let min_ratings = config.best_month_min_ratings;
    let ranking_task = tokio::task::spawn(async move {
        let pace = match year_scope {
            YearScope::Year(y) => pace::pace_report(&all_years, y, today),
            YearScope::AllTime => PaceReport::Empty,
        };
        (
            rewatch::rewatch_stats(&entries),
            rewatch::top_watched(&entries, top_limit),
            rewatch::busiest_days(&entries),
            rewatch::best_rated_months(&entries, min_ratings),
            pace,
        )
    });

    // Barrier: every fanned-out computation joins before assembly
    let (ratings, calendar, rankings, location) = tokio::join!(
        ratings_task,
        calendar_task,
        ranking_task,
        locations::location_report(&scoped, directory),
    );

    let (rating_histogram, detailed_rating_histogram, rating_stats, decade_histogram, release_years) =
        ratings.map_err(join_error)?;
    let (films_per_year, films_per_month, weekly_films, day_of_week, runtime, watch_span, streaks) =
        calendar.map_err(join_error)?;
    let (rewatches, top_watched, busiest_days, best_rated_months, pace) =
        rankings.map_err(join_error)?;
    let locations = location?;

    let unique_films = scoped
        .iter()
        .map(|e| e.film_key.as_str())
        .collect::<HashSet<_>>()
        .len();

    Ok(StatisticsSnapshot {
        scope,
        entry_count: scoped.len(),
        unique_films,
        rating_histogram,
        detailed_rating_histogram,
        decade_histogram,
        release_years,
        films_per_year,
        films_per_month,
        weekly_films,
        day_of_week,
        runtime,
        watch_span,
        rating_stats,
        streaks,
        pace,
        rewatches,
        top_watched,
        busiest_days,
        best_rated_months,
        locations,
        computed_at: Utc::now(),
    })
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Compute(format!("statistics task failed: {e}"))
}
