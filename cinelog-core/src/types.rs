//! Core domain types for cinelog-core
//!
//! A raw watch log arrives as a flat collection of [`WatchLogEntry`] values
//! fetched by the caller; the engine never merges incrementally. Scopes
//! (year selection × subset filter) key both cache lookups and the enriched
//! working set a snapshot is computed from.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sentinel used in derived film keys when the release year is unknown.
const UNKNOWN_YEAR_SENTINEL: &str = "unknown";

/// One logged viewing event, as supplied by the caller.
///
/// `watch_date` is the raw `yyyy-MM-dd` string; entries whose date is missing
/// or unparseable are silently dropped during normalization since they cannot
/// participate in any date-based statistic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchLogEntry {
    /// Stable global catalog identifier, when known
    #[serde(default)]
    pub catalog_id: Option<String>,
    /// Film title
    pub title: String,
    /// Watch date as `yyyy-MM-dd` (no time component)
    #[serde(default)]
    pub watch_date: Option<String>,
    /// Star rating, 0.0–5.0 in 0.5 steps
    #[serde(default)]
    pub star_rating: Option<f64>,
    /// Detailed rating, 0–100
    #[serde(default)]
    pub detailed_rating: Option<i32>,
    /// Runtime in minutes (non-positive values are treated as missing)
    #[serde(default)]
    pub runtime_minutes: Option<i32>,
    /// Release year of the film
    #[serde(default)]
    pub release_year: Option<i32>,
    /// Genre names
    #[serde(default)]
    pub genres: Vec<String>,
    /// Director name
    #[serde(default)]
    pub director: Option<String>,
    /// Free-text tag string
    #[serde(default)]
    pub tags: String,
    /// Whether this viewing was flagged as a rewatch
    #[serde(default)]
    pub rewatch: bool,
    /// Reference into the location directory
    #[serde(default)]
    pub location_id: Option<i64>,
    /// Poster/display artwork URL
    #[serde(default)]
    pub poster_url: Option<String>,
}

impl WatchLogEntry {
    /// Deterministic unique-film key.
    ///
    /// Catalog id when present, otherwise the lowercase-trimmed title joined
    /// with the release year (or a sentinel when the year is absent). Two
    /// entries with the same key are the same film; different keys are always
    /// different films even if the titles coincide.
    pub fn film_key(&self) -> String {
        if let Some(id) = &self.catalog_id {
            return id.clone();
        }
        let year = self
            .release_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| UNKNOWN_YEAR_SENTINEL.to_string());
        format!("{}::{}", self.title.trim().to_lowercase(), year)
    }
}

/// Parse a raw watch log supplied as a JSON array.
pub fn parse_log(json: &str) -> Result<Vec<WatchLogEntry>> {
    Ok(serde_json::from_str(json)?)
}

/// Subset filter partitioning the log into independent working sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilmFilter {
    /// Every entry
    All,
    /// Feature-length films (no "short" tag)
    Feature,
    /// Short films (tagged "short")
    Short,
}

impl FilmFilter {
    /// Whether an entry belongs to this subset.
    ///
    /// The tag string is tokenized case-insensitively and tolerant of
    /// whitespace/punctuation; an entry is a short iff any token equals
    /// "short".
    pub fn matches(&self, entry: &WatchLogEntry) -> bool {
        match self {
            FilmFilter::All => true,
            FilmFilter::Feature => !is_short(entry),
            FilmFilter::Short => is_short(entry),
        }
    }

    /// Storage/display form of the filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilmFilter::All => "all",
            FilmFilter::Feature => "feature",
            FilmFilter::Short => "short",
        }
    }
}

fn is_short(entry: &WatchLogEntry) -> bool {
    entry
        .tags
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .any(|t| t.eq_ignore_ascii_case("short"))
}

/// Year selection for a statistics scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YearScope {
    /// A specific calendar year
    Year(i32),
    /// The entire log
    AllTime,
}

impl fmt::Display for YearScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearScope::Year(y) => write!(f, "{}", y),
            YearScope::AllTime => write!(f, "all-time"),
        }
    }
}

/// Cache/computation scope: year selection × subset filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    /// Selected year or all-time
    pub year: YearScope,
    /// Active subset filter
    pub filter: FilmFilter,
}

impl ScopeKey {
    /// Build a scope for a specific year.
    pub fn year(year: i32, filter: FilmFilter) -> Self {
        Self {
            year: YearScope::Year(year),
            filter,
        }
    }

    /// Build an all-time scope.
    pub fn all_time(filter: FilmFilter) -> Self {
        Self {
            year: YearScope::AllTime,
            filter,
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.filter.as_str())
    }
}

/// Geographic coordinates of a viewing location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Directory record for one viewing location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationInfo {
    /// Display name
    pub name: String,
    /// Map coordinates, when known
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// Group this location is assigned to (e.g. a cinema chain)
    #[serde(default)]
    pub group: Option<String>,
}

/// Supplier of the complete raw watch log for the engine.
///
/// The caller is responsible for pagination/batching upstream; the engine
/// expects the full relevant set in one fetch.
#[async_trait]
pub trait WatchLogSource: Send + Sync {
    async fn fetch_entries(&self) -> Result<Vec<WatchLogEntry>>;
}

/// Batch lookup into the external location directory.
///
/// Ids missing from the returned map are treated as unresolvable: they are
/// excluded from map points but still contribute to aggregate counts.
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    async fn lookup(&self, ids: &[i64]) -> Result<HashMap<i64, LocationInfo>>;
}
