//! Entry normalization: raw log entries to enriched, calendar-aware entries.
//!
//! Normalization is a pure function with no failure mode: entries whose watch
//! date is missing or unparseable are dropped silently, everything else gets
//! its calendar fields and film key derived exactly once. The output order is
//! not guaranteed; aggregations sort where order matters.

use crate::types::{FilmFilter, WatchLogEntry};
use chrono::{Datelike, NaiveDate};

/// Date format used for `watch_date` input and for all day-level keys.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// A watch-log entry enriched with derived calendar fields.
///
/// Immutable once built; the engine rebuilds the whole set when the raw log
/// changes rather than mutating entries in place.
#[derive(Debug, Clone)]
pub struct EnrichedEntry {
    /// The raw entry this was derived from
    pub entry: WatchLogEntry,
    /// Parsed watch date
    pub date: NaiveDate,
    /// Calendar year of the watch date
    pub watch_year: i32,
    /// Month of the watch date (1–12)
    pub month: u32,
    /// ISO weekday (1=Monday … 7=Sunday, locale-independent)
    pub weekday: u32,
    /// ISO week-of-year (1–53)
    pub iso_week: u32,
    /// Canonical `yyyy-MM-dd` grouping/display key
    pub day_key: String,
    /// Deterministic unique-film key
    pub film_key: String,
}

impl EnrichedEntry {
    fn from_raw(entry: &WatchLogEntry, date: NaiveDate) -> Self {
        Self {
            date,
            watch_year: date.year(),
            month: date.month(),
            weekday: date.weekday().number_from_monday(),
            iso_week: date.iso_week().week(),
            day_key: date.format(DAY_KEY_FORMAT).to_string(),
            film_key: entry.film_key(),
            entry: entry.clone(),
        }
    }

    /// Start date of the ISO week this entry falls in (its Monday).
    pub fn week_start(&self) -> NaiveDate {
        self.date - chrono::Duration::days(self.weekday as i64 - 1)
    }
}

/// Normalize raw entries into enriched entries.
///
/// Entries without a parseable `yyyy-MM-dd` watch date are excluded — a
/// filtering rule, not a failure.
pub fn normalize(raw: &[WatchLogEntry]) -> Vec<EnrichedEntry> {
    let enriched: Vec<EnrichedEntry> = raw
        .iter()
        .filter_map(|entry| {
            let date = entry
                .watch_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d.trim(), DAY_KEY_FORMAT).ok())?;
            Some(EnrichedEntry::from_raw(entry, date))
        })
        .collect();

    let dropped = raw.len() - enriched.len();
    if dropped > 0 {
        tracing::debug!(dropped, total = raw.len(), "Dropped entries without a parseable date");
    }

    enriched
}

/// Apply a subset filter and normalize in one step.
///
/// Filtering happens before normalization so each filter has its own working
/// set, cached independently by the engine.
pub fn normalize_filtered(raw: &[WatchLogEntry], filter: FilmFilter) -> Vec<EnrichedEntry> {
    let subset: Vec<WatchLogEntry> = raw
        .iter()
        .filter(|e| filter.matches(e))
        .cloned()
        .collect();
    normalize(&subset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::testutil::raw_entry;

    #[test]
    fn test_normalize_derives_calendar_fields() {
        // 2024-01-01 was a Monday in ISO week 1
        let raw = vec![raw_entry("Heat", "2024-01-01")];
        let enriched = normalize(&raw);
        assert_eq!(enriched.len(), 1);

        let e = &enriched[0];
        assert_eq!(e.watch_year, 2024);
        assert_eq!(e.month, 1);
        assert_eq!(e.weekday, 1);
        assert_eq!(e.iso_week, 1);
        assert_eq!(e.day_key, "2024-01-01");
        assert_eq!(e.film_key, "heat::unknown");
        assert_eq!(e.week_start(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_normalize_drops_unparseable_dates() {
        let mut missing = raw_entry("Ran", "1985-06-01");
        missing.watch_date = None;
        let mut garbage = raw_entry("Ikiru", "1952-10-09");
        garbage.watch_date = Some("last tuesday".to_string());

        let raw = vec![raw_entry("Heat", "2024-01-01"), missing, garbage];
        let enriched = normalize(&raw);
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].entry.title, "Heat");
    }

    #[test]
    fn test_week_start_for_sunday() {
        // 2024-01-07 was a Sunday; its ISO week starts on 2024-01-01
        let raw = vec![raw_entry("Heat", "2024-01-07")];
        let enriched = normalize(&raw);
        assert_eq!(enriched[0].weekday, 7);
        assert_eq!(
            enriched[0].week_start(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_normalize_filtered_partitions_by_tag() {
        let mut short = raw_entry("La Jetée", "2024-02-01");
        short.tags = "Short, sci-fi".to_string();
        let raw = vec![raw_entry("Heat", "2024-01-01"), short];

        assert_eq!(normalize_filtered(&raw, FilmFilter::All).len(), 2);
        let features = normalize_filtered(&raw, FilmFilter::Feature);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].entry.title, "Heat");
        let shorts = normalize_filtered(&raw, FilmFilter::Short);
        assert_eq!(shorts.len(), 1);
        assert_eq!(shorts[0].entry.title, "La Jetée");
    }
}
