//! # cinelog-core
//!
//! Core library for cinelog - a personal film-watching log.
//!
//! This library is the local watch-log analytics engine: given the raw,
//! unordered collection of logged viewing events, it computes in memory the
//! full set of derived statistics a remote aggregation service would
//! otherwise provide, and keeps the results fresh through a bounded,
//! time-expiring cache.
//!
//! ## Architecture
//!
//! Data flows through three stages:
//! - **Normalize:** raw entries become an immutable, calendar-enriched
//!   working set per subset filter (all / feature / short)
//! - **Aggregate:** histograms, streaks, pace projections, rankings and
//!   location joins run in parallel over the same working set
//! - **Publish:** the joined [`StatisticsSnapshot`] lands in a TTL + size
//!   bounded cache keyed by scope (year selection × filter)
//!
//! ## Example
//!
//! ```rust,ignore
//! use cinelog_core::{Config, FilmFilter, ScopeKey, StatsEngine};
//!
//! let config = Config::load().expect("failed to load config");
//! let engine = StatsEngine::new(source, directory, config.stats)?;
//!
//! let scope = ScopeKey::year(2024, FilmFilter::All);
//! let snapshot = engine.get_or_compute(scope, false).await?;
//! println!("{} films this year", snapshot.unique_films);
//! ```

// Re-export commonly used items at the crate root
pub use cache::SnapshotCache;
pub use config::{Config, StatsConfig};
pub use engine::StatsEngine;
pub use error::{Error, Result};
pub use stats::snapshot::StatisticsSnapshot;
pub use types::*;

// Public modules
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod stats;
pub mod types;
