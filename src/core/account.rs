//! Account detail aggregation for the admin account screen.
//!
//! Assembles one user's profile, submissions, properties, owners,
//! assignments, recent activity and payments, and derives the account
//! metrics. Independent fetches run concurrently; a failing branch yields an
//! empty list plus an entry in [`AccountDetails::issues`] and never cancels
//! its siblings.

use crate::{
    core::{
        assignment::list_assignments_for_user,
        owner::list_owners_for_user,
        payments::{Payment, PaymentLookup, resolve_payments, total_amount},
        property::list_properties_for_user,
        submission::list_submissions_for_user,
        types::{Owner, OwnerPropertyAssignment, Property},
    },
    entities::{
        Profile, SubmissionState, UserActivity, form_submission, profile, user_activity,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{error, info, instrument, warn};

/// Shown when an assignment points at an owner that was not fetched
pub const UNKNOWN_OWNER: &str = "Unknown Owner";
/// Shown when an assignment points at a property that was not fetched
pub const UNKNOWN_PROPERTY: &str = "Unknown Property";

/// How many recent activities are included
const RECENT_ACTIVITY_LIMIT: u64 = 50;

/// Derived figures for one account
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetrics {
    /// Sum of all validated payment amounts
    pub total_revenue: f64,
    pub payment_count: usize,
    /// The primary submission exists and is completed
    pub has_completed_setup: bool,
    pub submission_count: usize,
    pub owner_count: usize,
    pub property_count: usize,
    /// Properties whose ownership percentages add up to more than 100
    pub over_allocated_properties: Vec<String>,
}

/// Everything the account detail screen shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    pub profile: profile::Model,
    pub submissions: Vec<form_submission::Model>,
    pub properties: Vec<Property>,
    pub owners: Vec<Owner>,
    pub assignments: Vec<OwnerPropertyAssignment>,
    pub activities: Vec<user_activity::Model>,
    pub payments: Vec<Payment>,
    /// Which payment lookup produced `payments`
    pub payment_source: Option<PaymentLookup>,
    pub metrics: AccountMetrics,
    /// User-visible problems hit while assembling the view
    pub issues: Vec<String>,
}

/// An assignment with its owner and property resolved for display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    pub assignment_id: String,
    pub owner_id: String,
    pub owner_name: String,
    pub property_id: String,
    pub property_label: String,
    pub ownership_percentage: f64,
    pub resident_at_property: bool,
}

impl AccountDetails {
    /// Resolves owner and property names for every assignment.
    ///
    /// Dangling references render as [`UNKNOWN_OWNER`] / [`UNKNOWN_PROPERTY`].
    #[must_use]
    pub fn assignment_views(&self) -> Vec<AssignmentView> {
        build_assignment_views(&self.assignments, &self.owners, &self.properties)
    }
}

/// Joins assignments with owner names and property labels.
#[must_use]
pub fn build_assignment_views(
    assignments: &[OwnerPropertyAssignment],
    owners: &[Owner],
    properties: &[Property],
) -> Vec<AssignmentView> {
    let owner_names: HashMap<&str, String> = owners
        .iter()
        .map(|o| (o.id.as_str(), o.display_name()))
        .collect();
    let property_labels: HashMap<&str, &str> = properties
        .iter()
        .map(|p| (p.id.as_str(), p.label.as_str()))
        .collect();

    assignments
        .iter()
        .map(|a| AssignmentView {
            assignment_id: a.id.clone(),
            owner_id: a.owner_id.clone(),
            owner_name: owner_names
                .get(a.owner_id.as_str())
                .cloned()
                .unwrap_or_else(|| UNKNOWN_OWNER.to_string()),
            property_id: a.property_id.clone(),
            property_label: property_labels
                .get(a.property_id.as_str())
                .map_or_else(|| UNKNOWN_PROPERTY.to_string(), |l| (*l).to_string()),
            ownership_percentage: a.ownership_percentage,
            resident_at_property: a.residency.resident_at_property,
        })
        .collect()
}

/// True when some submission is both primary and completed.
#[must_use]
pub fn has_completed_setup(submissions: &[form_submission::Model]) -> bool {
    submissions
        .iter()
        .any(|s| s.is_primary && s.state == SubmissionState::Completed)
}

/// Property ids whose assigned ownership adds up to more than 100%.
///
/// Writes are not blocked by this; it is reported for review only.
#[must_use]
pub fn over_allocated_properties(assignments: &[OwnerPropertyAssignment]) -> Vec<String> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for a in assignments {
        *totals.entry(a.property_id.as_str()).or_default() += a.ownership_percentage;
    }
    totals
        .into_iter()
        .filter(|(_, total)| *total > 100.0 + f64::EPSILON * 100.0)
        .map(|(id, _)| id.to_string())
        .collect()
}

/// Unwraps one fan-out branch; failures become an empty list and an issue.
fn settle<T>(what: &str, result: Result<Vec<T>>, issues: &mut Vec<String>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!("Failed to load {}: {}", what, e);
        issues.push(format!("Could not load {what}."));
        Vec::new()
    })
}

async fn recent_activities<C>(db: &C, user_id: &str) -> Result<Vec<user_activity::Model>>
where
    C: ConnectionTrait,
{
    UserActivity::find()
        .filter(user_activity::Column::UserId.eq(user_id))
        .order_by_desc(user_activity::Column::CreatedAt)
        .limit(RECENT_ACTIVITY_LIMIT)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Fetches the full account view for `user_id`.
///
/// Fails only when the profile itself is missing or unreadable.
#[instrument(skip(db))]
pub async fn fetch_account_details<C>(db: &C, user_id: &str) -> Result<AccountDetails>
where
    C: ConnectionTrait,
{
    let profile = Profile::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "user",
            id: user_id.to_string(),
        })?;

    let (submissions, properties, owners, assignments, activities) = tokio::join!(
        list_submissions_for_user(db, user_id),
        list_properties_for_user(db, user_id),
        list_owners_for_user(db, user_id),
        list_assignments_for_user(db, user_id),
        recent_activities(db, user_id),
    );

    let mut issues = Vec::new();
    let submissions = settle("submissions", submissions, &mut issues);
    let properties = settle("properties", properties, &mut issues);
    let owners = settle("owners", owners, &mut issues);
    let assignments = settle("owner assignments", assignments, &mut issues);
    let activities = settle("recent activity", activities, &mut issues);

    let submission_ids: Vec<String> = submissions.iter().map(|s| s.id.clone()).collect();
    let (payments, payment_source) = match resolve_payments(
        db,
        user_id,
        &submission_ids,
        &PaymentLookup::DEFAULT_ORDER,
    )
    .await
    {
        Ok(resolution) => (resolution.payments, resolution.source),
        Err(e) => {
            error!("Payments unavailable for user {}: {}", user_id, e);
            issues.push("Payment information could not be loaded.".to_string());
            (Vec::new(), None)
        }
    };

    let metrics = AccountMetrics {
        total_revenue: total_amount(&payments),
        payment_count: payments.len(),
        has_completed_setup: has_completed_setup(&submissions),
        submission_count: submissions.len(),
        owner_count: owners.len(),
        property_count: properties.len(),
        over_allocated_properties: over_allocated_properties(&assignments),
    };
    info!(
        user_id,
        payments = metrics.payment_count,
        issues = issues.len(),
        "Account details assembled"
    );

    Ok(AccountDetails {
        profile,
        submissions,
        properties,
        owners,
        assignments,
        activities,
        payments,
        payment_source,
        metrics,
        issues,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::types::Residency,
        test_utils::{
            create_test_owner, create_test_property, insert_test_profile, insert_test_purchase,
            insert_test_submission, setup_test_context,
        },
    };
    use chrono::Utc;

    fn assignment(
        id: &str,
        owner_id: &str,
        property_id: &str,
        pct: f64,
    ) -> OwnerPropertyAssignment {
        OwnerPropertyAssignment {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            owner_id: owner_id.to_string(),
            property_id: property_id.to_string(),
            ownership_percentage: pct,
            residency: Residency::default(),
            tax_credits: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_completed_setup_requires_primary_submission_completed() -> Result<()> {
        let ctx = setup_test_context().await?;
        insert_test_profile(&ctx.db, "user-1", "giulia@example.com").await?;
        insert_test_submission(&ctx.db, "s1", "user-1", SubmissionState::Completed, false).await?;
        insert_test_submission(&ctx.db, "s2", "user-1", SubmissionState::Completed, false).await?;
        insert_test_submission(&ctx.db, "s3", "user-1", SubmissionState::Processing, true).await?;

        let details = fetch_account_details(&ctx.db, "user-1").await?;
        assert_eq!(details.metrics.submission_count, 3);
        assert!(!details.metrics.has_completed_setup);

        insert_test_submission(&ctx.db, "s4", "user-2", SubmissionState::Completed, true).await?;
        insert_test_profile(&ctx.db, "user-2", "marco@example.com").await?;
        let other = fetch_account_details(&ctx.db, "user-2").await?;
        assert!(other.metrics.has_completed_setup);
        Ok(())
    }

    #[tokio::test]
    async fn test_all_payment_tiers_empty_yields_empty_payments() -> Result<()> {
        let ctx = setup_test_context().await?;
        insert_test_profile(&ctx.db, "user-1", "giulia@example.com").await?;
        insert_test_submission(&ctx.db, "s1", "user-1", SubmissionState::New, true).await?;

        let details = fetch_account_details(&ctx.db, "user-1").await?;
        assert!(details.payments.is_empty());
        assert_eq!(details.payment_source, None);
        assert_eq!(details.metrics.total_revenue, 0.0);
        assert!(details.issues.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_revenue_sums_only_valid_payments() -> Result<()> {
        let ctx = setup_test_context().await?;
        insert_test_profile(&ctx.db, "user-1", "giulia@example.com").await?;
        insert_test_submission(&ctx.db, "s1", "user-1", SubmissionState::Completed, true).await?;
        insert_test_purchase(&ctx.db, "pay-1", Some("user-1"), Some("s1"), Some(149.0)).await?;
        insert_test_purchase(&ctx.db, "pay-2", Some("user-1"), Some("s1"), None).await?;
        insert_test_purchase(&ctx.db, "pay-3", Some("user-1"), Some("s1"), Some(-20.0)).await?;

        let details = fetch_account_details(&ctx.db, "user-1").await?;
        assert_eq!(details.payment_source, Some(PaymentLookup::BySubmissionIds));
        assert_eq!(details.metrics.payment_count, 1);
        assert_eq!(details.metrics.total_revenue, 149.0);
        assert!(details.metrics.has_completed_setup);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_profile_is_not_found() -> Result<()> {
        let ctx = setup_test_context().await?;
        let result = fetch_account_details(&ctx.db, "ghost").await;
        assert!(matches!(result, Err(Error::NotFound { entity: "user", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_account_includes_owned_records_only() -> Result<()> {
        let ctx = setup_test_context().await?;
        insert_test_profile(&ctx.db, "user-1", "giulia@example.com").await?;
        create_test_owner(&ctx, "user-1", "Giulia", "Rossi").await?;
        create_test_property(&ctx, "user-1", "Casa Roma").await?;
        create_test_owner(&ctx, "user-2", "Anna", "Verdi").await?;

        let details = fetch_account_details(&ctx.db, "user-1").await?;
        assert_eq!(details.metrics.owner_count, 1);
        assert_eq!(details.metrics.property_count, 1);
        Ok(())
    }

    #[test]
    fn test_unknown_owner_fallback() {
        let now = Utc::now();
        let owner = Owner {
            id: "o-1".to_string(),
            user_id: "user-1".to_string(),
            first_name: "Giulia".to_string(),
            last_name: "Rossi".to_string(),
            date_of_birth: None,
            country_of_birth: None,
            citizenship: None,
            address: crate::core::types::Address::default(),
            italian_tax_code: None,
            is_resident_in_italy: false,
            italian_residence: None,
            created_at: now,
            updated_at: now,
        };
        let views = build_assignment_views(
            &[
                assignment("a-1", "o-1", "p-1", 50.0),
                assignment("a-2", "o-missing", "p-1", 50.0),
            ],
            &[owner],
            &[],
        );

        assert_eq!(views[0].owner_name, "Giulia Rossi");
        assert_eq!(views[1].owner_name, UNKNOWN_OWNER);
        assert_eq!(views[1].property_label, UNKNOWN_PROPERTY);
    }

    #[test]
    fn test_over_allocation_is_reported_not_enforced() {
        let flagged = over_allocated_properties(&[
            assignment("a-1", "o-1", "p-1", 60.0),
            assignment("a-2", "o-2", "p-1", 60.0),
            assignment("a-3", "o-1", "p-2", 50.0),
            assignment("a-4", "o-2", "p-2", 50.0),
        ]);
        assert_eq!(flagged, vec!["p-1".to_string()]);
    }
}
