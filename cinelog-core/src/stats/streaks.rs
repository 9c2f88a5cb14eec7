//! Daily and weekly consecutive-run detection.
//!
//! Streaks are computed fresh per scope from the sorted set of distinct
//! calendar dates (or ISO week starts) carrying at least one entry; nothing
//! is persisted between computations.

use crate::stats::enrich::EnrichedEntry;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// One maximal run of consecutive calendar units.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreakRun {
    /// Run length in days (or weeks)
    pub length: u32,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Title of the first-logged film on the start date (lowest identity)
    pub first_film: Option<String>,
    /// Title of the last-logged film on the end date (highest identity)
    pub last_film: Option<String>,
}

/// Daily and weekly streaks for one scope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreakStats {
    pub longest_daily: StreakRun,
    /// Run ending at the most recent logged date
    pub current_daily: StreakRun,
    /// Whether the current daily run includes today or yesterday
    pub current_daily_active: bool,
    pub longest_weekly: StreakRun,
    pub current_weekly: StreakRun,
    /// Whether the most recent logged week is this ISO week or the previous one
    pub current_weekly_active: bool,
}

/// Compute daily and weekly streaks.
///
/// `today` anchors the "active" checks; the run-length math itself is
/// invariant under input reordering since only the distinct date set matters.
pub fn streak_stats(entries: &[EnrichedEntry], today: NaiveDate) -> StreakStats {
    let days: Vec<NaiveDate> = entries
        .iter()
        .map(|e| e.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let weeks: Vec<NaiveDate> = entries
        .iter()
        .map(|e| e.week_start())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let (longest_daily, current_daily) = runs(&days, 1, entries, unit_day);
    let (longest_weekly, current_weekly) = runs(&weeks, 7, entries, unit_week);

    let current_daily_active = days
        .last()
        .map(|&last| (today - last).num_days() <= 1)
        .unwrap_or(false);
    let this_week = week_start_of(today);
    let current_weekly_active = weeks
        .last()
        .map(|&last| last == this_week || last == this_week - chrono::Duration::days(7))
        .unwrap_or(false);

    StreakStats {
        longest_daily,
        current_daily,
        current_daily_active,
        longest_weekly,
        current_weekly,
        current_weekly_active,
    }
}

fn week_start_of(date: NaiveDate) -> NaiveDate {
    use chrono::Datelike;
    date - chrono::Duration::days(date.weekday().number_from_monday() as i64 - 1)
}

// Membership tests matching a streak unit back to entries for film tie-breaks
fn unit_day(entry: &EnrichedEntry, unit: NaiveDate) -> bool {
    entry.date == unit
}

fn unit_week(entry: &EnrichedEntry, unit: NaiveDate) -> bool {
    entry.week_start() == unit
}

/// Walk sorted distinct unit dates and return (longest, current) runs.
///
/// A run continues while consecutive units are exactly `gap_days` apart.
/// Longest keeps the first maximal run found; current is the run ending at
/// the most recent unit.
fn runs(
    units: &[NaiveDate],
    gap_days: i64,
    entries: &[EnrichedEntry],
    in_unit: fn(&EnrichedEntry, NaiveDate) -> bool,
) -> (StreakRun, StreakRun) {
    if units.is_empty() {
        return (StreakRun::default(), StreakRun::default());
    }

    let mut longest = (0usize, 0usize); // (start index, length)
    let mut run_start = 0usize;
    for i in 1..=units.len() {
        let broke = i == units.len() || (units[i] - units[i - 1]).num_days() != gap_days;
        if broke {
            let len = i - run_start;
            if len > longest.1 {
                longest = (run_start, len);
            }
            run_start = i;
        }
    }

    // Walk backward from the most recent unit
    let mut current_start = units.len() - 1;
    while current_start > 0
        && (units[current_start] - units[current_start - 1]).num_days() == gap_days
    {
        current_start -= 1;
    }

    let make = |start_idx: usize, len: usize| {
        let start = units[start_idx];
        let end = units[start_idx + len - 1];
        StreakRun {
            length: len as u32,
            start: Some(start),
            end: Some(end),
            first_film: boundary_film(entries, start, in_unit, false),
            last_film: boundary_film(entries, end, in_unit, true),
        }
    };

    (
        make(longest.0, longest.1),
        make(current_start, units.len() - current_start),
    )
}

/// Film shown at a streak boundary: lowest identity on the start unit,
/// highest identity on the end unit.
fn boundary_film(
    entries: &[EnrichedEntry],
    unit: NaiveDate,
    in_unit: fn(&EnrichedEntry, NaiveDate) -> bool,
    highest: bool,
) -> Option<String> {
    let candidates = entries.iter().filter(|e| in_unit(e, unit));
    let chosen = if highest {
        candidates.max_by(|a, b| a.film_key.cmp(&b.film_key))
    } else {
        candidates.min_by(|a, b| a.film_key.cmp(&b.film_key))
    };
    chosen.map(|e| e.entry.title.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::enrich::normalize;
    use crate::stats::testutil::raw_entry;

    fn entries_on(dates: &[&str]) -> Vec<EnrichedEntry> {
        let raw: Vec<_> = dates
            .iter()
            .enumerate()
            .map(|(i, d)| raw_entry(&format!("film-{i}"), d))
            .collect();
        normalize(&raw)
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_log_has_no_streaks() {
        let stats = streak_stats(&[], day("2024-01-10"));
        assert_eq!(stats.longest_daily, StreakRun::default());
        assert_eq!(stats.current_daily.length, 0);
        assert!(!stats.current_daily_active);
        assert!(!stats.current_weekly_active);
    }

    #[test]
    fn test_single_date_is_both_longest_and_current() {
        let stats = streak_stats(&entries_on(&["2024-01-05"]), day("2024-01-05"));
        assert_eq!(stats.longest_daily.length, 1);
        assert_eq!(stats.current_daily.length, 1);
        assert!(stats.current_daily_active);
        assert_eq!(stats.longest_weekly.length, 1);
    }

    #[test]
    fn test_longest_run_keeps_first_on_tie() {
        // Two separate 2-day runs; the earlier one must win the tie
        let stats = streak_stats(
            &entries_on(&["2024-01-01", "2024-01-02", "2024-01-10", "2024-01-11"]),
            day("2024-01-11"),
        );
        assert_eq!(stats.longest_daily.length, 2);
        assert_eq!(stats.longest_daily.start, Some(day("2024-01-01")));
        assert_eq!(stats.current_daily.length, 2);
        assert_eq!(stats.current_daily.start, Some(day("2024-01-10")));
    }

    #[test]
    fn test_current_streak_active_window() {
        let entries = entries_on(&["2024-01-01", "2024-01-02"]);

        // Active the day of the last entry and the day after
        assert!(streak_stats(&entries, day("2024-01-02")).current_daily_active);
        assert!(streak_stats(&entries, day("2024-01-03")).current_daily_active);
        // Dead streak two days later, but the historical length is kept
        let later = streak_stats(&entries, day("2024-01-04"));
        assert!(!later.current_daily_active);
        assert_eq!(later.current_daily.length, 2);
    }

    #[test]
    fn test_streak_invariant_under_reordering() {
        let dates = ["2024-03-03", "2024-03-01", "2024-03-02", "2024-03-01"];
        let reversed: Vec<&str> = dates.iter().rev().copied().collect();
        let a = streak_stats(&entries_on(&dates), day("2024-03-03"));
        let b = streak_stats(&entries_on(&reversed), day("2024-03-03"));
        assert_eq!(a.longest_daily.length, 3);
        assert_eq!(a.longest_daily.length, b.longest_daily.length);
        assert_eq!(a.longest_daily.start, b.longest_daily.start);
    }

    #[test]
    fn test_weekly_streak_seven_day_continuity() {
        // Mondays of consecutive ISO weeks
        let stats = streak_stats(
            &entries_on(&["2024-01-03", "2024-01-09", "2024-01-01"]),
            day("2024-01-09"),
        );
        // Weeks starting 2024-01-01 and 2024-01-08: a 2-week run
        assert_eq!(stats.longest_weekly.length, 2);
        assert_eq!(stats.longest_weekly.start, Some(day("2024-01-01")));
        assert_eq!(stats.longest_weekly.end, Some(day("2024-01-08")));
        assert!(stats.current_weekly_active);
    }

    #[test]
    fn test_weekly_streak_breaks_on_gap() {
        // Weeks starting 2024-01-01 and 2024-01-15: an 8+ day gap at week level
        let stats = streak_stats(&entries_on(&["2024-01-02", "2024-01-16"]), day("2024-01-16"));
        assert_eq!(stats.longest_weekly.length, 1);
        assert_eq!(stats.current_weekly.length, 1);
    }

    #[test]
    fn test_weekly_active_includes_previous_week() {
        let entries = entries_on(&["2024-01-02"]); // ISO week starting 2024-01-01
        assert!(streak_stats(&entries, day("2024-01-05")).current_weekly_active);
        assert!(streak_stats(&entries, day("2024-01-10")).current_weekly_active);
        assert!(!streak_stats(&entries, day("2024-01-17")).current_weekly_active);
    }

    #[test]
    fn test_boundary_films_use_identity_order() {
        // Two films on the same start date, one on the end date
        let mut raw = vec![
            raw_entry("Zodiac", "2024-01-01"),
            raw_entry("Alien", "2024-01-01"),
            raw_entry("Heat", "2024-01-02"),
        ];
        raw[2].catalog_id = Some("zzz-heat".to_string());
        let stats = streak_stats(&normalize(&raw), day("2024-01-02"));

        assert_eq!(stats.longest_daily.first_film.as_deref(), Some("Alien"));
        assert_eq!(stats.longest_daily.last_film.as_deref(), Some("Heat"));
    }
}
