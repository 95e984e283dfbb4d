//! Illustrative chart series for the analytics screen.
//!
//! Nothing here is measured history. The series are spread around the
//! aggregates from [`crate::core::analytics`] so the dashboard has a shape to
//! draw, and every series carries `synthetic: true`.

use crate::core::analytics::DashboardAnalytics;
use chrono::{DateTime, Datelike, Days, Months, Utc};
use serde::Serialize;

/// Number of months drawn on the monthly charts
pub const MONTHLY_POINTS: u32 = 6;

/// One point on a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// `YYYY-MM-DD` for daily series, `YYYY-MM` for monthly ones
    pub label: String,
    pub value: f64,
}

/// A named chart series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    /// Always true: the points are interpolated, not measured
    pub synthetic: bool,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    fn synthetic(name: &str, points: Vec<ChartPoint>) -> Self {
        Self {
            name: name.to_string(),
            synthetic: true,
            points,
        }
    }

    /// Sum of all point values
    #[must_use]
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }
}

/// The chart bundle shown next to the analytics figures
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCharts {
    pub revenue_by_day: ChartSeries,
    pub submissions_by_day: ChartSeries,
    pub revenue_by_month: ChartSeries,
    pub users_by_month: ChartSeries,
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Splits `cents` over `weights` in whole cents by largest remainder.
///
/// Every share is non-negative and the shares add up to exactly `cents`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn allocate_cents(cents: u64, weights: &[f64]) -> Vec<u64> {
    let weight_sum: f64 = weights.iter().sum();
    if weights.is_empty() || weight_sum <= 0.0 {
        return vec![0; weights.len()];
    }

    let exact: Vec<f64> = weights
        .iter()
        .map(|w| cents as f64 * w / weight_sum)
        .collect();
    let mut shares: Vec<u64> = exact.iter().map(|x| x.floor().max(0.0) as u64).collect();

    let assigned: u64 = shares.iter().sum();
    let mut by_remainder: Vec<usize> = (0..weights.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    if assigned <= cents {
        let leftover = (cents - assigned) as usize;
        for &i in by_remainder.iter().cycle().take(leftover) {
            shares[i] += 1;
        }
    } else {
        // Float error can floor one share too high; take it back from the smallest remainders.
        let mut excess = assigned - cents;
        for &i in by_remainder.iter().rev() {
            if excess == 0 {
                break;
            }
            if shares[i] > 0 {
                shares[i] -= 1;
                excess -= 1;
            }
        }
    }
    shares
}

/// Spreads `total` over the days of the current month up to `now`.
///
/// Days get a gently varying weight. Values are whole cents, never negative,
/// and add up to `total` (negative totals draw as zero).
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn daily_series(
    name: &str,
    total: f64,
    month_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ChartSeries {
    let first = month_start.date_naive();
    let days = u64::from(now.date_naive().day0()) + 1;

    let weights: Vec<f64> = (0..days)
        .map(|i| 1.0 + 0.35 * ((i as f64) * 0.9).sin())
        .collect();
    let cents = if total.is_finite() {
        (total * 100.0).round().max(0.0) as u64
    } else {
        0
    };

    let points = allocate_cents(cents, &weights)
        .into_iter()
        .enumerate()
        .map(|(i, share)| ChartPoint {
            label: (first + Days::new(i as u64)).format("%Y-%m-%d").to_string(),
            value: share as f64 / 100.0,
        })
        .collect();
    ChartSeries::synthetic(name, points)
}

/// Draws `MONTHLY_POINTS` months ending at the current one.
///
/// The last two points are the measured previous and current values; earlier
/// months continue the same trend backwards and never drop below zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn monthly_series(
    name: &str,
    previous: f64,
    current: f64,
    month_start: DateTime<Utc>,
) -> ChartSeries {
    let first = month_start.date_naive();
    let step = current - previous;

    let points = (0..MONTHLY_POINTS)
        .map(|i| {
            let months_back = MONTHLY_POINTS - 1 - i;
            let month = first - Months::new(months_back);
            let value = match months_back {
                0 => current,
                1 => previous,
                n => (previous - step * f64::from(n - 1)).max(0.0),
            };
            ChartPoint {
                label: format!("{:04}-{:02}", month.year(), month.month()),
                value: round_cents(value),
            }
        })
        .collect();
    ChartSeries::synthetic(name, points)
}

/// Builds every dashboard chart from measured analytics.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn build_charts(analytics: &DashboardAnalytics) -> DashboardCharts {
    let month_start = analytics.boundaries.current_start;
    let now = analytics.generated_at;
    let current = &analytics.current_month;
    let previous = &analytics.previous_month;

    DashboardCharts {
        revenue_by_day: daily_series("revenue", current.revenue, month_start, now),
        submissions_by_day: daily_series(
            "submissions",
            current.submissions as f64,
            month_start,
            now,
        ),
        revenue_by_month: monthly_series("revenue", previous.revenue, current.revenue, month_start),
        users_by_month: monthly_series(
            "users",
            previous.users as f64,
            current.users as f64,
            month_start,
        ),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    #![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_daily_series_sums_to_total() {
        let series = daily_series("revenue", 1_234.56, utc(2024, 3, 1), utc(2024, 3, 17));
        assert!(series.synthetic);
        assert_eq!(series.points.len(), 17);
        assert_eq!(series.points[0].label, "2024-03-01");
        assert_eq!(series.points[16].label, "2024-03-17");
        assert!((series.total() - 1_234.56).abs() < 1e-6);
    }

    #[test]
    fn test_daily_series_is_never_negative_and_exact_in_cents() {
        for day in [1, 2, 15, 31] {
            for cents in (0..5_000u64).chain([123_456, 9_999_999]) {
                let total = cents as f64 / 100.0;
                let series = daily_series("revenue", total, utc(2024, 3, 1), utc(2024, 3, day));
                assert!(
                    series.points.iter().all(|p| p.value >= 0.0),
                    "negative point for total {total} on day {day}"
                );
                let sum: u64 = series
                    .points
                    .iter()
                    .map(|p| (p.value * 100.0).round() as u64)
                    .sum();
                assert_eq!(sum, cents, "total {total} on day {day}");
            }
        }
    }

    #[test]
    fn test_negative_total_draws_as_zero() {
        let series = daily_series("revenue", -12.5, utc(2024, 3, 1), utc(2024, 3, 5));
        assert!(series.points.iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn test_daily_series_on_first_day_is_single_point() {
        let series = daily_series("submissions", 3.0, utc(2024, 3, 1), utc(2024, 3, 1));
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].value, 3.0);
    }

    #[test]
    fn test_monthly_series_ends_with_measured_values() {
        let series = monthly_series("revenue", 100.0, 150.0, utc(2024, 2, 1));
        assert!(series.synthetic);
        assert_eq!(series.points.len(), MONTHLY_POINTS as usize);

        let last = &series.points[5];
        let before = &series.points[4];
        assert_eq!((last.label.as_str(), last.value), ("2024-02", 150.0));
        assert_eq!((before.label.as_str(), before.value), ("2024-01", 100.0));
        assert_eq!(series.points[0].label, "2023-09");
        assert!(series.points.iter().all(|p| p.value >= 0.0));
    }
}
