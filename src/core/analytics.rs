//! Platform-wide analytics for the admin dashboard.
//!
//! Counts and revenue are measured for all time, the current calendar month
//! and the previous one. Month windows are always computed in UTC so the same
//! instant yields the same figures regardless of the caller's offset.

use crate::{
    core::payments::{STATUS_COMPLETED, total_amount, validate_purchase},
    entities::{
        FormSubmission, Owner, Profile, Property, Purchase, SubmissionState, form_submission,
        owner, profile, property, purchase,
    },
    errors::Result,
};
use chrono::{DateTime, Datelike, Days, Months, NaiveTime, TimeZone, Utc};
use sea_orm::{Condition, PaginatorTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Start instants of the months around a reference instant, in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBoundaries {
    /// First instant of the month before the current one
    pub previous_start: DateTime<Utc>,
    /// First instant of the month containing the reference instant
    pub current_start: DateTime<Utc>,
    /// First instant of the following month
    pub next_start: DateTime<Utc>,
}

impl MonthBoundaries {
    /// `[current_start, next_start)`
    #[must_use]
    pub const fn current_window(&self) -> Window {
        Window {
            start: self.current_start,
            end: self.next_start,
        }
    }

    /// `[previous_start, current_start)`
    #[must_use]
    pub const fn previous_window(&self) -> Window {
        Window {
            start: self.previous_start,
            end: self.current_start,
        }
    }
}

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Computes the month boundaries around `instant`.
///
/// The instant is converted to UTC first, so the result depends only on the
/// instant and never on the offset it was expressed in.
#[must_use]
pub fn month_boundaries<Tz: TimeZone>(instant: &DateTime<Tz>) -> MonthBoundaries {
    let today = instant.with_timezone(&Utc).date_naive();
    let first = today - Days::new(u64::from(today.day0()));
    let at_midnight = |d: chrono::NaiveDate| d.and_time(NaiveTime::MIN).and_utc();

    MonthBoundaries {
        previous_start: at_midnight(first - Months::new(1)),
        current_start: at_midnight(first),
        next_start: at_midnight(first + Months::new(1)),
    }
}

/// Percentage change from `previous` to `current`, rounded.
///
/// A zero baseline reports 0 when `current` is also zero and 100 otherwise.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn growth_rate(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return if current > 0.0 { 100 } else { 0 };
    }
    ((current - previous) / previous * 100.0).round() as i64
}

/// Counts and revenue over one period
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMetrics {
    pub users: u64,
    pub submissions: u64,
    pub completed_submissions: u64,
    pub properties: u64,
    pub owners: u64,
    /// Sum of completed purchases that pass the payment guard
    pub revenue: f64,
}

/// Month-over-month growth, in whole percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthRates {
    pub users: i64,
    pub submissions: i64,
    pub properties: i64,
    pub revenue: i64,
}

impl GrowthRates {
    /// Growth of every metric from `previous` to `current`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn between(current: &PeriodMetrics, previous: &PeriodMetrics) -> Self {
        Self {
            users: growth_rate(current.users as f64, previous.users as f64),
            submissions: growth_rate(current.submissions as f64, previous.submissions as f64),
            properties: growth_rate(current.properties as f64, previous.properties as f64),
            revenue: growth_rate(current.revenue, previous.revenue),
        }
    }
}

/// Everything the analytics screen shows apart from charts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    pub totals: PeriodMetrics,
    pub current_month: PeriodMetrics,
    pub previous_month: PeriodMetrics,
    pub growth: GrowthRates,
    pub boundaries: MonthBoundaries,
    pub generated_at: DateTime<Utc>,
}

fn within<C: ColumnTrait>(column: C, window: Option<Window>) -> Condition {
    window.map_or_else(Condition::all, |w| {
        Condition::all()
            .add(column.gte(w.start))
            .add(column.lt(w.end))
    })
}

async fn completed_revenue<C>(db: &C, window: Option<Window>) -> Result<f64>
where
    C: ConnectionTrait,
{
    let rows = Purchase::find()
        .filter(purchase::Column::Status.eq(STATUS_COMPLETED))
        .filter(within(purchase::Column::CreatedAt, window))
        .all(db)
        .await?;
    let payments: Vec<_> = rows.into_iter().filter_map(validate_purchase).collect();
    Ok(total_amount(&payments))
}

/// Measures one period; `None` means all time.
pub async fn fetch_period_metrics<C>(db: &C, window: Option<Window>) -> Result<PeriodMetrics>
where
    C: ConnectionTrait,
{
    let (users, submissions, completed, properties, owners, revenue) = tokio::join!(
        Profile::find()
            .filter(within(profile::Column::CreatedAt, window))
            .count(db),
        FormSubmission::find()
            .filter(within(form_submission::Column::CreatedAt, window))
            .count(db),
        FormSubmission::find()
            .filter(form_submission::Column::State.eq(SubmissionState::Completed))
            .filter(within(form_submission::Column::CreatedAt, window))
            .count(db),
        Property::find()
            .filter(within(property::Column::CreatedAt, window))
            .count(db),
        Owner::find()
            .filter(within(owner::Column::CreatedAt, window))
            .count(db),
        completed_revenue(db, window),
    );

    let metrics = PeriodMetrics {
        users: users?,
        submissions: submissions?,
        completed_submissions: completed?,
        properties: properties?,
        owners: owners?,
        revenue: revenue?,
    };
    debug!(?window, ?metrics, "Period measured");
    Ok(metrics)
}

/// Measures all time, this month and last month, and derives growth.
///
/// # Arguments
/// * `db` - Database connection
/// * `now` - Reference instant; only its UTC value matters
#[instrument(skip(db))]
pub async fn fetch_dashboard_analytics<C>(db: &C, now: DateTime<Utc>) -> Result<DashboardAnalytics>
where
    C: ConnectionTrait,
{
    let boundaries = month_boundaries(&now);
    let (totals, current_month, previous_month) = tokio::join!(
        fetch_period_metrics(db, None),
        fetch_period_metrics(db, Some(boundaries.current_window())),
        fetch_period_metrics(db, Some(boundaries.previous_window())),
    );
    let (totals, current_month, previous_month) = (totals?, current_month?, previous_month?);

    let growth = GrowthRates::between(&current_month, &previous_month);
    info!(
        users = totals.users,
        revenue = totals.revenue,
        "Dashboard analytics computed"
    );

    Ok(DashboardAnalytics {
        totals,
        current_month,
        previous_month,
        growth,
        boundaries,
        generated_at: now,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{insert_test_purchase_at, setup_test_db};
    use chrono::FixedOffset;
    use sea_orm::Set;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_growth_rate_zero_baselines() {
        assert_eq!(growth_rate(0.0, 0.0), 0);
        assert_eq!(growth_rate(5.0, 0.0), 100);
    }

    #[test]
    fn test_growth_rate_rounds_relative_change() {
        assert_eq!(growth_rate(15.0, 10.0), 50);
        assert_eq!(growth_rate(5.0, 10.0), -50);
        assert_eq!(growth_rate(4.0, 3.0), 33);
        assert_eq!(growth_rate(0.0, 8.0), -100);
    }

    #[test]
    fn test_month_boundaries_mid_month() {
        let b = month_boundaries(&utc(2024, 3, 15, 12));
        assert_eq!(b.previous_start, utc(2024, 2, 1, 0));
        assert_eq!(b.current_start, utc(2024, 3, 1, 0));
        assert_eq!(b.next_start, utc(2024, 4, 1, 0));
    }

    #[test]
    fn test_month_boundaries_cross_year() {
        let b = month_boundaries(&utc(2025, 1, 31, 23));
        assert_eq!(b.previous_start, utc(2024, 12, 1, 0));
        assert_eq!(b.next_start, utc(2025, 2, 1, 0));

        let b = month_boundaries(&utc(2024, 12, 5, 0));
        assert_eq!(b.next_start, utc(2025, 1, 1, 0));
    }

    #[test]
    fn test_month_boundaries_are_timezone_invariant() {
        // 2024-03-31 23:30 UTC is already April in Rome and still March in New York.
        let instant = utc(2024, 3, 31, 23) + chrono::Duration::minutes(30);
        let rome = instant.with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());
        let new_york = instant.with_timezone(&FixedOffset::west_opt(4 * 3600).unwrap());
        let tokyo = instant.with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap());

        let expected = month_boundaries(&instant);
        assert_eq!(expected.current_start, utc(2024, 3, 1, 0));
        assert_eq!(month_boundaries(&rome), expected);
        assert_eq!(month_boundaries(&new_york), expected);
        assert_eq!(month_boundaries(&tokyo), expected);
    }

    #[tokio::test]
    async fn test_dashboard_analytics_windows_and_growth() -> Result<()> {
        let db = setup_test_db().await?;
        let now = utc(2024, 3, 15, 12);

        for (id, at) in [
            ("u1", utc(2024, 2, 3, 9)),
            ("u2", utc(2024, 3, 2, 9)),
            ("u3", utc(2024, 3, 10, 9)),
            ("u4", utc(2023, 11, 20, 9)),
        ] {
            profile::ActiveModel {
                id: Set(id.to_string()),
                email: Set(format!("{id}@example.com")),
                full_name: Set(None),
                created_at: Set(at),
            }
            .insert(&db)
            .await?;
        }

        insert_test_purchase_at(&db, "p1", Some(100.0), STATUS_COMPLETED, utc(2024, 2, 10, 8))
            .await?;
        insert_test_purchase_at(&db, "p2", Some(150.0), STATUS_COMPLETED, utc(2024, 3, 5, 8))
            .await?;
        insert_test_purchase_at(&db, "p3", Some(75.0), "pending", utc(2024, 3, 6, 8)).await?;
        insert_test_purchase_at(&db, "p4", None, STATUS_COMPLETED, utc(2024, 3, 7, 8)).await?;

        let analytics = fetch_dashboard_analytics(&db, now).await?;

        assert_eq!(analytics.totals.users, 4);
        assert_eq!(analytics.current_month.users, 2);
        assert_eq!(analytics.previous_month.users, 1);
        assert_eq!(analytics.growth.users, 100);

        assert_eq!(analytics.totals.revenue, 250.0);
        assert_eq!(analytics.current_month.revenue, 150.0);
        assert_eq!(analytics.previous_month.revenue, 100.0);
        assert_eq!(analytics.growth.revenue, 50);

        assert_eq!(analytics.growth.submissions, 0);
        Ok(())
    }
}
