//! Year-end pace projection for the year currently in progress.
//!
//! Two extrapolations of the selected year's cumulative watch count:
//! linear (constant monthly rate from the months elapsed so far) and seasonal
//! (remaining count distributed by the shape of a historical per-month
//! baseline averaged across all logged years). Past years report only the
//! actual curve; the all-time scope reports nothing.

use crate::stats::distributions::monthly_entry_counts;
use crate::stats::enrich::EnrichedEntry;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

/// One point of a cumulative monthly curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPoint {
    /// Calendar month, 1–12
    pub month: u32,
    /// Cumulative entry count by the end of this month
    pub cumulative: f64,
}

/// Pace report for one scope, tagged so consumers can match exhaustively.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaceReport {
    /// All-time scope, or a year with no data
    Empty,
    /// A completed year: actuals only, no projection
    Actual { curve: Vec<MonthPoint> },
    /// The year in progress: actuals plus both projections
    Projected {
        /// Actual cumulative counts through the current month
        actual: Vec<MonthPoint>,
        /// Constant-rate extrapolation through December
        linear: Vec<MonthPoint>,
        /// Seasonally shaped extrapolation through December
        seasonal: Vec<MonthPoint>,
        linear_total: f64,
        seasonal_total: f64,
    },
}

impl PaceReport {
    /// Projected year-end totals, when a projection exists.
    pub fn projected_totals(&self) -> Option<(f64, f64)> {
        match self {
            PaceReport::Projected {
                linear_total,
                seasonal_total,
                ..
            } => Some((*linear_total, *seasonal_total)),
            _ => None,
        }
    }
}

/// Build the pace report for a selected year.
///
/// `history` is the full multi-year entry set for the active filter; the
/// selected year's own entries are drawn from it. `today` decides whether the
/// year is in progress.
pub fn pace_report(history: &[EnrichedEntry], year: i32, today: NaiveDate) -> PaceReport {
    let monthly = monthly_entry_counts(history);

    let year_counts: [usize; 12] = std::array::from_fn(|i| {
        monthly
            .get(&(year, i as u32 + 1))
            .copied()
            .unwrap_or(0)
    });
    if year_counts.iter().all(|&c| c == 0) {
        return PaceReport::Empty;
    }

    let cumulative = cumulative_curve(&year_counts);

    if year != today.year() {
        return PaceReport::Actual {
            curve: (1..=12u32)
                .map(|m| MonthPoint {
                    month: m,
                    cumulative: cumulative[m as usize - 1],
                })
                .collect(),
        };
    }

    let now_month = today.month() as usize; // months elapsed, 1–12
    let actual: Vec<MonthPoint> = (1..=now_month as u32)
        .map(|m| MonthPoint {
            month: m,
            cumulative: cumulative[m as usize - 1],
        })
        .collect();
    let by_now = cumulative[now_month - 1];

    // Linear: extend at the average rate of the months elapsed so far
    let rate = by_now / now_month as f64;
    let linear = extend(&actual, now_month, |k| by_now + rate * (k - now_month) as f64);
    let linear_total = curve_total(&linear, by_now);

    // Seasonal: distribute the remainder along the historical baseline shape.
    // The in-progress year is left out of the baseline so its empty future
    // months cannot flatten the shape.
    let baseline = baseline_cumulative(history, year);
    let season_total = seasonal_total(by_now, now_month, &baseline);
    let seasonal = match season_total {
        Some(total) => {
            let frac_now = baseline[now_month - 1] / baseline[11];
            extend(&actual, now_month, |k| {
                let frac_k = baseline[k - 1] / baseline[11];
                if frac_now >= 1.0 {
                    by_now
                } else {
                    by_now + (total - by_now) * ((frac_k - frac_now) / (1.0 - frac_now))
                }
            })
        }
        // Degenerate baseline: fall back to the linear curve
        None => linear.clone(),
    };
    let seasonal_total = curve_total(&seasonal, by_now);

    PaceReport::Projected {
        actual,
        linear,
        seasonal,
        linear_total,
        seasonal_total,
    }
}

fn cumulative_curve(counts: &[usize; 12]) -> [f64; 12] {
    let mut out = [0.0f64; 12];
    let mut running = 0usize;
    for (i, &c) in counts.iter().enumerate() {
        running += c;
        out[i] = running as f64;
    }
    out
}

/// Append projected months after `now_month` to a copy of the actual curve.
fn extend(
    actual: &[MonthPoint],
    now_month: usize,
    project: impl Fn(usize) -> f64,
) -> Vec<MonthPoint> {
    let mut curve = actual.to_vec();
    for k in (now_month + 1)..=12 {
        curve.push(MonthPoint {
            month: k as u32,
            cumulative: project(k),
        });
    }
    curve
}

fn curve_total(curve: &[MonthPoint], fallback: f64) -> f64 {
    curve.last().map(|p| p.cumulative).unwrap_or(fallback)
}

/// Historical baseline: for each calendar month, the cumulative count by that
/// month averaged across all years with any data, excluding `skip_year`.
fn baseline_cumulative(history: &[EnrichedEntry], skip_year: i32) -> [f64; 12] {
    let monthly = monthly_entry_counts(history);
    let years: BTreeSet<i32> = history
        .iter()
        .map(|e| e.watch_year)
        .filter(|&y| y != skip_year)
        .collect();

    let mut baseline = [0.0f64; 12];
    if years.is_empty() {
        return baseline;
    }
    for &y in &years {
        let counts: [usize; 12] =
            std::array::from_fn(|i| monthly.get(&(y, i as u32 + 1)).copied().unwrap_or(0));
        let cumulative = cumulative_curve(&counts);
        for (slot, value) in baseline.iter_mut().zip(cumulative) {
            *slot += value;
        }
    }
    for slot in baseline.iter_mut() {
        *slot /= years.len() as f64;
    }
    baseline
}

/// Seasonal year-end total: actual-so-far scaled by the baseline's completed
/// fraction at the current month. None when the baseline has no usable shape.
fn seasonal_total(by_now: f64, now_month: usize, baseline: &[f64; 12]) -> Option<f64> {
    let annual = baseline[11];
    if annual <= 0.0 {
        return None;
    }
    let frac_now = baseline[now_month - 1] / annual;
    if frac_now <= 0.0 {
        return None;
    }
    Some(by_now / frac_now)
}
