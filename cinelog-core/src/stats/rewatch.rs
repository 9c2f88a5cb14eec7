//! Rewatch statistics, top-watched ranking, and leaderboard lists.
//!
//! All grouping is by the deterministic unique-film key and every emitted
//! list is explicitly sorted with the tie-break rules spelled out below.

use crate::stats::distributions::percentage;
use crate::stats::enrich::EnrichedEntry;
use serde::Serialize;
use std::collections::HashMap;

/// Rewatch statistics for one scope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewatchStats {
    /// Entries flagged as rewatches
    pub rewatch_entries: usize,
    /// Entries not flagged as rewatches
    pub first_watch_entries: usize,
    /// Share of rewatch entries, 0–100
    pub rewatch_pct: f64,
    /// Distinct films with at least one rewatch entry
    pub films_rewatched: usize,
    /// Title of the single most-rewatched film
    pub most_rewatched: Option<MostRewatched>,
}

/// The film with the most rewatch entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MostRewatched {
    pub title: String,
    pub count: usize,
}

/// Compute rewatch statistics.
pub fn rewatch_stats(entries: &[EnrichedEntry]) -> RewatchStats {
    let rewatch_entries = entries.iter().filter(|e| e.entry.rewatch).count();
    let total = entries.len();

    // Rewatch count and a display title per film key
    let mut per_film: HashMap<&str, (usize, &str)> = HashMap::new();
    for e in entries.iter().filter(|e| e.entry.rewatch) {
        let slot = per_film
            .entry(e.film_key.as_str())
            .or_insert((0, e.entry.title.as_str()));
        slot.0 += 1;
    }

    // Deterministic max-reduction over (count, title): the alphabetically
    // later title wins count ties
    let most_rewatched = per_film
        .values()
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map(|&(count, title)| MostRewatched {
            title: title.to_string(),
            count,
        });

    RewatchStats {
        rewatch_entries,
        first_watch_entries: total - rewatch_entries,
        rewatch_pct: percentage(rewatch_entries, total),
        films_rewatched: per_film.len(),
        most_rewatched,
    }
}

/// One row of the top-watched ranking.
///
/// Display metadata comes from the film's most recent watch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopWatchedFilm {
    pub film_key: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub release_year: Option<i32>,
    /// Number of logged watches in scope
    pub watch_count: usize,
    /// Day key of the most recent watch
    pub last_watched: String,
}

/// Rank films by watch count (ties: most recent watch first), capped at `limit`.
pub fn top_watched(entries: &[EnrichedEntry], limit: usize) -> Vec<TopWatchedFilm> {
    let mut groups: HashMap<&str, (usize, &EnrichedEntry)> = HashMap::new();
    for e in entries {
        let slot = groups.entry(e.film_key.as_str()).or_insert((0, e));
        slot.0 += 1;
        // Fixed-width day keys compare correctly as strings
        if e.day_key > slot.1.day_key {
            slot.1 = e;
        }
    }

    let mut ranked: Vec<TopWatchedFilm> = groups
        .into_iter()
        .map(|(film_key, (watch_count, latest))| TopWatchedFilm {
            film_key: film_key.to_string(),
            title: latest.entry.title.clone(),
            poster_url: latest.entry.poster_url.clone(),
            release_year: latest.entry.release_year,
            watch_count,
            last_watched: latest.day_key.clone(),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.watch_count
            .cmp(&a.watch_count)
            .then_with(|| b.last_watched.cmp(&a.last_watched))
            .then_with(|| a.film_key.cmp(&b.film_key))
    });
    ranked.truncate(limit);
    ranked
}

/// One row of the most-films-in-a-day leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusiestDay {
    /// Day key
    pub date: String,
    pub count: usize,
}

/// Full most-films-in-a-day leaderboard: count descending, recent dates first
/// on ties.
pub fn busiest_days(entries: &[EnrichedEntry]) -> Vec<BusiestDay> {
    let mut per_day: HashMap<&str, usize> = HashMap::new();
    for e in entries {
        *per_day.entry(e.day_key.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<BusiestDay> = per_day
        .into_iter()
        .map(|(date, count)| BusiestDay {
            date: date.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| b.date.cmp(&a.date)));
    ranked
}

/// One row of the best-rated-month leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestRatedMonth {
    pub year: i32,
    pub month: u32,
    /// Mean star rating of the month's rated entries
    pub average_rating: f64,
    /// Number of rated entries that month
    pub rated_films: usize,
}

/// Best-rated months with at least `min_ratings` rated entries.
///
/// Ordered by rating descending, then film count, then later year, then later
/// month.
pub fn best_rated_months(entries: &[EnrichedEntry], min_ratings: usize) -> Vec<BestRatedMonth> {
    let mut per_month: HashMap<(i32, u32), (f64, usize)> = HashMap::new();
    for e in entries {
        if let Some(r) = e.entry.star_rating {
            let slot = per_month.entry((e.watch_year, e.month)).or_insert((0.0, 0));
            slot.0 += r;
            slot.1 += 1;
        }
    }

    let mut ranked: Vec<BestRatedMonth> = per_month
        .into_iter()
        .filter(|(_, (_, count))| *count >= min_ratings.max(1))
        .map(|((year, month), (sum, count))| BestRatedMonth {
            year,
            month,
            average_rating: sum / count as f64,
            rated_films: count,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.average_rating
            .partial_cmp(&a.average_rating)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.rated_films.cmp(&a.rated_films))
            .then_with(|| b.year.cmp(&a.year))
            .then_with(|| b.month.cmp(&a.month))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::enrich::normalize;
    use crate::stats::testutil::{rated_entry, raw_entry, rewatch_entry};

    #[test]
    fn test_rewatch_stats_counts_and_percentage() {
        let entries = normalize(&[
            raw_entry("A", "2024-01-01"),
            rewatch_entry("A", "2024-01-02"),
            raw_entry("B", "2024-01-02"),
        ]);
        let stats = rewatch_stats(&entries);
        assert_eq!(stats.rewatch_entries, 1);
        assert_eq!(stats.first_watch_entries, 2);
        assert!((stats.rewatch_pct - 33.333).abs() < 0.01);
        assert_eq!(stats.films_rewatched, 1);
        assert_eq!(stats.most_rewatched.as_ref().unwrap().title, "A");
    }

    #[test]
    fn test_most_rewatched_tie_goes_to_later_title() {
        let entries = normalize(&[
            rewatch_entry("Alien", "2024-01-01"),
            rewatch_entry("Zodiac", "2024-01-02"),
        ]);
        let stats = rewatch_stats(&entries);
        let most = stats.most_rewatched.unwrap();
        assert_eq!(most.title, "Zodiac");
        assert_eq!(most.count, 1);
    }

    #[test]
    fn test_rewatch_stats_empty() {
        let stats = rewatch_stats(&[]);
        assert_eq!(stats.rewatch_pct, 0.0);
        assert!(stats.most_rewatched.is_none());
    }

    #[test]
    fn test_top_watched_ranks_and_caps() {
        let mut raw = vec![
            raw_entry("Heat", "2024-01-01"),
            raw_entry("Heat", "2024-03-01"),
            raw_entry("Ran", "2024-02-01"),
            raw_entry("Ran", "2024-04-01"),
            raw_entry("Alien", "2024-05-01"),
        ];
        raw[1].poster_url = Some("https://posters/heat-remaster.jpg".to_string());

        let ranked = top_watched(&normalize(&raw), 2);
        assert_eq!(ranked.len(), 2);
        // Both have 2 watches; Ran's latest (04-01) beats Heat's (03-01)
        assert_eq!(ranked[0].title, "Ran");
        assert_eq!(ranked[1].title, "Heat");
        // Metadata from the most recent watch
        assert_eq!(ranked[1].last_watched, "2024-03-01");
        assert_eq!(
            ranked[1].poster_url.as_deref(),
            Some("https://posters/heat-remaster.jpg")
        );
    }

    #[test]
    fn test_busiest_days_is_full_leaderboard() {
        let entries = normalize(&[
            raw_entry("A", "2024-01-01"),
            raw_entry("B", "2024-01-01"),
            raw_entry("C", "2024-01-01"),
            raw_entry("D", "2024-02-01"),
            raw_entry("E", "2024-02-01"),
            raw_entry("F", "2024-03-01"),
        ]);
        let ranked = busiest_days(&entries);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].date, "2024-01-01");
        assert_eq!(ranked[0].count, 3);
        assert_eq!(ranked[2].count, 1);
    }

    #[test]
    fn test_best_rated_months_requires_two_ratings() {
        let entries = normalize(&[
            rated_entry("A", "2024-01-10", 5.0),
            rated_entry("B", "2024-01-20", 4.0),
            rated_entry("C", "2024-02-10", 5.0), // only one rating
        ]);
        let ranked = best_rated_months(&entries, 2);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].month, 1);
        assert_eq!(ranked[0].average_rating, 4.5);
        assert_eq!(ranked[0].rated_films, 2);
    }

    #[test]
    fn test_best_rated_months_tie_breaks() {
        // Equal averages: more films wins; then later year/month
        let entries = normalize(&[
            rated_entry("A", "2023-05-01", 4.0),
            rated_entry("B", "2023-05-02", 4.0),
            rated_entry("C", "2023-05-03", 4.0),
            rated_entry("D", "2024-03-01", 4.0),
            rated_entry("E", "2024-03-02", 4.0),
        ]);
        let ranked = best_rated_months(&entries, 2);
        assert_eq!(ranked[0].year, 2023); // 3 films beats 2
        assert_eq!(ranked[1].year, 2024);
    }
}
