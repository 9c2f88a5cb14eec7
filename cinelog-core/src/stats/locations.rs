//! Per-location aggregation joined against the external location directory.
//!
//! The directory lookup is the single external call in the statistics fan-out:
//! one batch query for the distinct location ids present in scope. Ids the
//! directory cannot resolve are dropped from the labeled lists but their
//! entries still count toward the aggregate total.

use crate::error::Result;
use crate::stats::enrich::EnrichedEntry;
use crate::types::LocationDirectory;
use serde::Serialize;
use std::collections::HashMap;

/// Name of the group bucket for locations without an assigned group.
pub const UNGROUPED: &str = "Ungrouped";

/// A resolvable location rendered on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub count: usize,
}

/// A labeled count row (specific location or location group).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Location aggregates for one scope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocationReport {
    /// Locations with resolvable coordinates, count descending
    pub map_points: Vec<MapPoint>,
    /// Per-location counts, count descending then label ascending
    pub location_counts: Vec<LabelCount>,
    /// Per-group counts (unassigned locations fall into "Ungrouped")
    pub group_counts: Vec<LabelCount>,
    /// Entries carrying any location reference, resolvable or not
    pub located_entries: usize,
}

/// Aggregate entry counts per location and resolve them via the directory.
pub async fn location_report(
    entries: &[EnrichedEntry],
    directory: &dyn LocationDirectory,
) -> Result<LocationReport> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for e in entries {
        if let Some(id) = e.entry.location_id {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    let located_entries: usize = counts.values().sum();
    if counts.is_empty() {
        return Ok(LocationReport::default());
    }

    let ids: Vec<i64> = counts.keys().copied().collect();
    let resolved = directory.lookup(&ids).await?;
    if resolved.len() < ids.len() {
        tracing::debug!(
            requested = ids.len(),
            resolved = resolved.len(),
            "Some location ids were not found in the directory"
        );
    }

    let mut map_points = Vec::new();
    let mut location_counts = Vec::new();
    let mut group_totals: HashMap<String, usize> = HashMap::new();

    for (id, &count) in &counts {
        let Some(info) = resolved.get(id) else {
            continue;
        };
        location_counts.push(LabelCount {
            label: info.name.clone(),
            count,
        });
        if let Some(coords) = info.coordinates {
            map_points.push(MapPoint {
                name: info.name.clone(),
                latitude: coords.latitude,
                longitude: coords.longitude,
                count,
            });
        }
        let group = info.group.clone().unwrap_or_else(|| UNGROUPED.to_string());
        *group_totals.entry(group).or_insert(0) += count;
    }

    map_points.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    let mut group_counts: Vec<LabelCount> = group_totals
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    for list in [&mut location_counts, &mut group_counts] {
        list.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    }

    Ok(LocationReport {
        map_points,
        location_counts,
        group_counts,
        located_entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::enrich::normalize;
    use crate::stats::testutil::{located_entry, StaticDirectory};
    use crate::types::{Coordinates, LocationInfo};

    fn directory() -> StaticDirectory {
        let mut dir = StaticDirectory::default();
        dir.insert(
            1,
            LocationInfo {
                name: "Rio Cinema".to_string(),
                coordinates: Some(Coordinates {
                    latitude: 51.549,
                    longitude: -0.075,
                }),
                group: Some("Indie".to_string()),
            },
        );
        dir.insert(
            2,
            LocationInfo {
                name: "Home".to_string(),
                coordinates: None,
                group: None,
            },
        );
        dir
    }

    #[tokio::test]
    async fn test_report_groups_and_sorts() {
        let entries = normalize(&[
            located_entry("A", "2024-01-01", 2),
            located_entry("B", "2024-01-02", 2),
            located_entry("C", "2024-01-03", 1),
        ]);
        let report = location_report(&entries, &directory()).await.unwrap();

        assert_eq!(report.located_entries, 3);
        // Only the cinema has coordinates
        assert_eq!(report.map_points.len(), 1);
        assert_eq!(report.map_points[0].name, "Rio Cinema");
        assert_eq!(report.map_points[0].count, 1);

        assert_eq!(report.location_counts[0].label, "Home");
        assert_eq!(report.location_counts[0].count, 2);

        // Unassigned group falls into the sentinel bucket
        let groups: Vec<&str> = report.group_counts.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(groups, vec!["Ungrouped", "Indie"]);
    }

    #[tokio::test]
    async fn test_directory_miss_keeps_total() {
        let entries = normalize(&[
            located_entry("A", "2024-01-01", 1),
            located_entry("B", "2024-01-02", 99), // unknown id
        ]);
        let report = location_report(&entries, &directory()).await.unwrap();

        assert_eq!(report.located_entries, 2);
        assert_eq!(report.location_counts.len(), 1);
        assert_eq!(report.map_points.len(), 1);
    }

    #[tokio::test]
    async fn test_no_locations_skips_lookup() {
        let entries = normalize(&[crate::stats::testutil::raw_entry("A", "2024-01-01")]);
        // A directory that fails every call proves lookup is skipped
        let report = location_report(&entries, &StaticDirectory::failing())
            .await
            .unwrap();
        assert_eq!(report.located_entries, 0);
        assert!(report.map_points.is_empty());
    }
}
