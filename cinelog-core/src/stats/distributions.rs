//! Histograms and summary statistics over an enriched entry set.
//!
//! Every builder here is a pure, total function: empty input yields
//! zero-filled buckets and 0.0 percentages, never an error. Output lists are
//! explicitly sorted; nothing relies on map iteration order.

use crate::stats::enrich::EnrichedEntry;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Number of half-star buckets in the fixed rating domain {0.5 … 5.0}.
const STAR_BUCKETS: usize = 10;

/// One bucket of the star-rating histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBucket {
    /// Star value (0.5 … 5.0)
    pub stars: f64,
    pub count: usize,
    /// Share of all rated entries, 0–100
    pub percentage: f64,
}

/// Star-rating histogram over the fixed half-star domain.
///
/// Buckets with no data still appear with count 0.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RatingHistogram {
    pub buckets: Vec<RatingBucket>,
    /// Number of entries carrying a star rating
    pub rated_entries: usize,
}

/// Build the star-rating histogram.
pub fn rating_histogram(entries: &[EnrichedEntry]) -> RatingHistogram {
    let mut counts = [0usize; STAR_BUCKETS];
    for e in entries {
        if let Some(idx) = star_bucket_index(e.entry.star_rating) {
            counts[idx] += 1;
        }
    }
    let total: usize = counts.iter().sum();

    let buckets = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| RatingBucket {
            stars: (i + 1) as f64 * 0.5,
            count,
            percentage: percentage(count, total),
        })
        .collect();

    RatingHistogram {
        buckets,
        rated_entries: total,
    }
}

fn star_bucket_index(rating: Option<f64>) -> Option<usize> {
    let r = rating?;
    let half_steps = (r * 2.0).round() as i64;
    if (1..=STAR_BUCKETS as i64).contains(&half_steps) {
        Some(half_steps as usize - 1)
    } else {
        None
    }
}

/// Detailed-rating histogram over the full 0–100 integer domain.
///
/// Counts one rating per unique film: the most recent non-null detailed
/// rating wins, even when a film was rated on several watches.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedRatingHistogram {
    /// `counts[n]` is the number of films whose latest detailed rating is `n`
    pub counts: Vec<usize>,
    /// Number of distinct films with at least one detailed rating
    pub rated_films: usize,
}

impl Default for DetailedRatingHistogram {
    fn default() -> Self {
        Self {
            counts: vec![0; 101],
            rated_films: 0,
        }
    }
}

/// Build the detailed-rating histogram with most-recent-per-film dedup.
pub fn detailed_rating_histogram(entries: &[EnrichedEntry]) -> DetailedRatingHistogram {
    let mut rated: Vec<&EnrichedEntry> = entries
        .iter()
        .filter(|e| e.entry.detailed_rating.is_some())
        .collect();
    // Most recent first; identity breaks date ties so dedup is deterministic
    rated.sort_by(|a, b| {
        b.day_key
            .cmp(&a.day_key)
            .then_with(|| b.film_key.cmp(&a.film_key))
    });

    let mut seen = HashSet::new();
    let mut hist = DetailedRatingHistogram::default();
    for e in rated {
        if !seen.insert(e.film_key.as_str()) {
            continue;
        }
        if let Some(r) = e.entry.detailed_rating {
            let clamped = r.clamp(0, 100) as usize;
            hist.counts[clamped] += 1;
            hist.rated_films += 1;
        }
    }
    hist
}

/// One bucket of the release-decade histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecadeBucket {
    /// Decade start year (e.g. 1990)
    pub decade: i32,
    pub count: usize,
}

/// Release-decade histogram, gap-filled from the earliest populated decade
/// through the present decade. Entries without a release year are excluded.
pub fn decade_histogram(entries: &[EnrichedEntry], today: NaiveDate) -> Vec<DecadeBucket> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for e in entries {
        if let Some(year) = e.entry.release_year {
            *counts.entry(year.div_euclid(10) * 10).or_insert(0) += 1;
        }
    }

    let Some((&first, _)) = counts.iter().next() else {
        return Vec::new();
    };
    let last = today.year().div_euclid(10) * 10;

    (first..=last.max(first))
        .step_by(10)
        .map(|decade| DecadeBucket {
            decade,
            count: counts.get(&decade).copied().unwrap_or(0),
        })
        .collect()
}

/// Count of films for one distinct release year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

/// Per-release-year counts; only years present in the data, no gap-filling.
pub fn release_year_counts(entries: &[EnrichedEntry]) -> Vec<YearCount> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for e in entries {
        if let Some(year) = e.entry.release_year {
            *counts.entry(year).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect()
}

/// Watch activity for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyCount {
    pub year: i32,
    /// Raw entry count
    pub entries: usize,
    /// Distinct unique-film keys
    pub unique_films: usize,
}

/// Watch activity for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub entries: usize,
    pub unique_films: usize,
}

/// Films watched per year, sorted by year ascending.
pub fn films_per_year(entries: &[EnrichedEntry]) -> Vec<YearlyCount> {
    let mut groups: BTreeMap<i32, Vec<&EnrichedEntry>> = BTreeMap::new();
    for e in entries {
        groups.entry(e.watch_year).or_default().push(e);
    }
    groups
        .into_iter()
        .map(|(year, group)| YearlyCount {
            year,
            entries: group.len(),
            unique_films: distinct_films(&group),
        })
        .collect()
}

/// Films watched per (year, month), sorted ascending.
///
/// Year-view consumers filter this list down to a single year.
pub fn films_per_month(entries: &[EnrichedEntry]) -> Vec<MonthlyCount> {
    let mut groups: BTreeMap<(i32, u32), Vec<&EnrichedEntry>> = BTreeMap::new();
    for e in entries {
        groups.entry((e.watch_year, e.month)).or_default().push(e);
    }
    groups
        .into_iter()
        .map(|((year, month), group)| MonthlyCount {
            year,
            month,
            entries: group.len(),
            unique_films: distinct_films(&group),
        })
        .collect()
}

fn distinct_films(group: &[&EnrichedEntry]) -> usize {
    group
        .iter()
        .map(|e| e.film_key.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Watch activity for one ISO week (year-scoped statistic).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyCount {
    /// ISO week-of-year
    pub week: u32,
    /// Earliest day key within the week
    pub start: String,
    /// Latest day key within the week
    pub end: String,
    pub count: usize,
}

/// Films watched per ISO week, sorted by week start ascending.
///
/// Buckets are keyed by the week's start date, not the bare week number: the
/// last days of December can fall into week 1 of the *next* ISO year and must
/// not merge with January's week 1.
pub fn weekly_films(entries: &[EnrichedEntry]) -> Vec<WeeklyCount> {
    let mut groups: BTreeMap<NaiveDate, Vec<&EnrichedEntry>> = BTreeMap::new();
    for e in entries {
        groups.entry(e.week_start()).or_default().push(e);
    }
    groups
        .into_iter()
        .map(|(week_start, group)| {
            let start = group.iter().map(|e| e.day_key.as_str()).min().unwrap_or("");
            let end = group.iter().map(|e| e.day_key.as_str()).max().unwrap_or("");
            WeeklyCount {
                week: week_start.iso_week().week(),
                start: start.to_string(),
                end: end.to_string(),
                count: group.len(),
            }
        })
        .collect()
}

/// Viewing counts across the seven weekdays, always fully populated.
#[derive(Debug, Clone, Serialize)]
pub struct DayOfWeekPattern {
    /// Entry count per weekday, index 0 = Monday … 6 = Sunday
    pub counts: [usize; 7],
    /// Share of all entries per weekday, 0–100
    pub percentages: [f64; 7],
}

impl Default for DayOfWeekPattern {
    fn default() -> Self {
        Self {
            counts: [0; 7],
            percentages: [0.0; 7],
        }
    }
}

/// Build the day-of-week viewing pattern.
pub fn day_of_week_pattern(entries: &[EnrichedEntry]) -> DayOfWeekPattern {
    let mut counts = [0usize; 7];
    for e in entries {
        counts[(e.weekday - 1) as usize] += 1;
    }
    let total = entries.len();
    let mut percentages = [0.0f64; 7];
    for (i, &count) in counts.iter().enumerate() {
        percentages[i] = percentage(count, total);
    }
    DayOfWeekPattern {
        counts,
        percentages,
    }
}

/// A single film with its runtime, for longest/shortest display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilmRuntime {
    pub title: String,
    pub minutes: i32,
}

/// Runtime statistics over entries with a positive runtime.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuntimeStats {
    /// Entries that carried a usable runtime
    pub counted: usize,
    pub total_minutes: i64,
    pub mean: f64,
    /// Median runtime (average of the two middle values for even counts)
    pub median: f64,
    pub longest: Option<FilmRuntime>,
    pub shortest: Option<FilmRuntime>,
}

/// Build runtime statistics; missing or non-positive runtimes are excluded.
pub fn runtime_stats(entries: &[EnrichedEntry]) -> RuntimeStats {
    let mut timed: Vec<(&EnrichedEntry, i32)> = entries
        .iter()
        .filter_map(|e| match e.entry.runtime_minutes {
            Some(m) if m > 0 => Some((e, m)),
            _ => None,
        })
        .collect();

    if timed.is_empty() {
        return RuntimeStats::default();
    }

    timed.sort_by_key(|(_, m)| *m);
    let minutes: Vec<i32> = timed.iter().map(|(_, m)| *m).collect();
    let total: i64 = minutes.iter().map(|&m| m as i64).sum();

    let film = |(e, m): &(&EnrichedEntry, i32)| FilmRuntime {
        title: e.entry.title.clone(),
        minutes: *m,
    };

    RuntimeStats {
        counted: timed.len(),
        total_minutes: total,
        mean: total as f64 / timed.len() as f64,
        median: median_of_sorted(&minutes),
        longest: timed.last().map(film),
        shortest: timed.first().map(film),
    }
}

fn median_of_sorted(sorted: &[i32]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// First and last watch dates in scope, with the inclusive day count between.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WatchSpan {
    /// Earliest day key in scope
    pub first: Option<String>,
    /// Latest day key in scope
    pub last: Option<String>,
    /// Inclusive days between first and last (1 for a single date)
    pub days: i64,
}

/// Compute the watch span.
pub fn watch_span(entries: &[EnrichedEntry]) -> WatchSpan {
    let first = entries.iter().map(|e| e.date).min();
    let last = entries.iter().map(|e| e.date).max();
    match (first, last) {
        (Some(first), Some(last)) => WatchSpan {
            days: (last - first).num_days() + 1,
            first: Some(first.format(crate::stats::enrich::DAY_KEY_FORMAT).to_string()),
            last: Some(last.format(crate::stats::enrich::DAY_KEY_FORMAT).to_string()),
        },
        _ => WatchSpan::default(),
    }
}

/// Summary statistics over star ratings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RatingStats {
    /// Number of rated entries
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Most frequent rating value; ties go to the higher value
    pub mode: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Share of ratings at 5.0 stars, 0–100
    pub five_star_pct: f64,
}

/// Build star-rating summary statistics.
pub fn rating_stats(entries: &[EnrichedEntry]) -> RatingStats {
    let mut ratings: Vec<f64> = Vec::new();
    let mut bucket_counts = [0usize; STAR_BUCKETS];
    for e in entries {
        if let Some(idx) = star_bucket_index(e.entry.star_rating) {
            bucket_counts[idx] += 1;
            ratings.push((idx + 1) as f64 * 0.5);
        }
    }
    if ratings.is_empty() {
        return RatingStats::default();
    }
    ratings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = ratings.len();
    let mean = ratings.iter().sum::<f64>() / count as f64;
    let variance = ratings.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / count as f64;

    let median = if count % 2 == 0 {
        (ratings[count / 2 - 1] + ratings[count / 2]) / 2.0
    } else {
        ratings[count / 2]
    };

    // Scanning ascending with >= keeps the higher value on count ties
    let mut mode_idx = 0;
    for (i, &c) in bucket_counts.iter().enumerate() {
        if c > 0 && c >= bucket_counts[mode_idx] {
            mode_idx = i;
        }
    }
    let mode = (mode_idx + 1) as f64 * 0.5;

    let five_star = bucket_counts[STAR_BUCKETS - 1];

    RatingStats {
        count,
        mean,
        median,
        mode,
        std_dev: variance.sqrt(),
        five_star_pct: percentage(five_star, count),
    }
}

/// Guarded percentage: 0.0 for an empty denominator, never NaN.
pub(crate) fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Map of (year, month) to entry count, used by the pace projector.
pub fn monthly_entry_counts(entries: &[EnrichedEntry]) -> HashMap<(i32, u32), usize> {
    let mut counts = HashMap::new();
    for e in entries {
        *counts.entry((e.watch_year, e.month)).or_insert(0) += 1;
    }
    counts
}
