//! Statistics computation for the watch-log engine.
//!
//! Everything in this module is a pure function over an immutable
//! [`EnrichedEntry`](enrich::EnrichedEntry) working set; the only external
//! call is the location directory lookup in [`locations`]. The
//! [`snapshot`] module fans the aggregations out as tasks and joins them all
//! into one [`StatisticsSnapshot`](snapshot::StatisticsSnapshot) before it is
//! published to the cache.

pub mod distributions;
pub mod enrich;
pub mod locations;
pub mod pace;
pub mod rewatch;
pub mod snapshot;
pub mod streaks;

pub use enrich::{normalize, normalize_filtered, EnrichedEntry};
pub use snapshot::{build_snapshot, StatisticsSnapshot};
