//! Assignment business logic - link owners to properties.
//!
//! The owner and property must exist (foreign keys); the sum of ownership
//! percentages per property is not checked here. See
//! `core::account::AccountDetails::over_allocated_properties` for the report.

use crate::{
    core::{
        activity::ActivityEntry,
        crud::{CrudContext, invalid_field, new_id, validate_required, validate_user_id},
        transform,
        types::{AssignmentInput, AssignmentPatch, OwnerPropertyAssignment},
    },
    entities::{Assignment as AssignmentEntity, assignment},
    errors::{DashboardError, Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde_json::json;
use tracing::{debug, instrument};

/// Checks the ownership share and residency dates of one assignment.
pub fn validate_assignment_values(
    assignment: &OwnerPropertyAssignment,
) -> std::result::Result<(), DashboardError> {
    let pct = assignment.ownership_percentage;
    if !pct.is_finite() || pct <= 0.0 || pct > 100.0 {
        return Err(invalid_field(
            "Ownership percentage must be greater than 0 and at most 100.",
        ));
    }
    if let (Some(from), Some(to)) = (assignment.residency.from, assignment.residency.to) {
        if to < from {
            return Err(invalid_field("Residency end date is before its start date."));
        }
    }
    if assignment.tax_credits.is_some_and(|c| !c.is_finite() || c < 0.0) {
        return Err(invalid_field("Tax credits must be a non-negative amount."));
    }
    Ok(())
}

/// Lists a user's assignments, oldest first.
pub async fn list_assignments_for_user<C>(
    db: &C,
    user_id: &str,
) -> Result<Vec<OwnerPropertyAssignment>>
where
    C: ConnectionTrait,
{
    let rows = AssignmentEntity::find()
        .filter(assignment::Column::UserId.eq(user_id))
        .order_by_asc(assignment::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(transform::assignment_from_row).collect())
}

/// Finds an assignment by id.
pub async fn get_assignment(
    db: &DatabaseConnection,
    id: &str,
) -> Result<Option<OwnerPropertyAssignment>> {
    Ok(AssignmentEntity::find_by_id(id.to_string())
        .one(db)
        .await?
        .map(transform::assignment_from_row))
}

/// Assigns an owner to a property.
#[instrument(skip(ctx, input))]
pub async fn create_assignment(
    ctx: &CrudContext,
    input: AssignmentInput,
    user_id: &str,
) -> Result<OwnerPropertyAssignment> {
    const TITLE: &str = "Could not assign owner";
    validate_user_id(user_id).map_err(|e| ctx.reject(TITLE, e))?;
    validate_required(&[
        ("owner", input.owner_id.as_str()),
        ("property", input.property_id.as_str()),
    ])
    .map_err(|e| ctx.reject(TITLE, e))?;

    let assignment = transform::assignment_from_input(new_id(), user_id, input, Utc::now());
    validate_assignment_values(&assignment).map_err(|e| ctx.reject(TITLE, e))?;

    let row = transform::assignment_to_row(&assignment)
        .insert(&ctx.db)
        .await
        .map_err(|e| ctx.backend_failure(TITLE, "create assignment", &e))?;
    let created = transform::assignment_from_row(row);
    debug!("Created assignment {}", created.id);

    ctx.succeed(
        ActivityEntry::new(
            user_id,
            "assignment_created",
            format!(
                "Assigned owner {} to property {} ({}%)",
                created.owner_id, created.property_id, created.ownership_percentage
            ),
        )
        .with_metadata(json!({
            "assignment_id": created.id,
            "owner_id": created.owner_id,
            "property_id": created.property_id,
        })),
        "Owner assigned",
        "The owner was linked to the property.".to_string(),
    );
    Ok(created)
}

/// Applies `patch` over `current` and writes the result.
#[instrument(skip(ctx, patch, current))]
pub async fn update_assignment(
    ctx: &CrudContext,
    id: &str,
    patch: AssignmentPatch,
    user_id: &str,
    current: &OwnerPropertyAssignment,
) -> Result<OwnerPropertyAssignment> {
    const TITLE: &str = "Could not update assignment";
    validate_user_id(user_id).map_err(|e| ctx.reject(TITLE, e))?;
    validate_required(&[("assignment id", id)]).map_err(|e| ctx.reject(TITLE, e))?;

    let merged = transform::apply_assignment_patch(current, patch, Utc::now());
    validate_assignment_values(&merged).map_err(|e| ctx.reject(TITLE, e))?;

    let mut row = transform::assignment_to_row(&merged);
    row.id = Set(id.to_string());
    row.user_id = Set(user_id.to_string());
    let updated = AssignmentEntity::update(row)
        .filter(assignment::Column::UserId.eq(user_id))
        .exec(&ctx.db)
        .await
        .map_err(|e| match e {
            DbErr::RecordNotUpdated => Error::NotFound {
                entity: "assignment",
                id: id.to_string(),
            },
            other => ctx.backend_failure(TITLE, "update assignment", &other),
        })?;
    let updated = transform::assignment_from_row(updated);

    ctx.succeed(
        ActivityEntry::new(user_id, "assignment_updated", "Updated ownership details")
            .with_metadata(json!({ "assignment_id": updated.id })),
        "Assignment updated",
        "Ownership details were saved.".to_string(),
    );
    Ok(updated)
}

/// Removes an assignment. Returns `false` when no matching row existed.
#[instrument(skip(ctx, for_logging))]
pub async fn delete_assignment(
    ctx: &CrudContext,
    id: &str,
    user_id: &str,
    for_logging: Option<&OwnerPropertyAssignment>,
) -> Result<bool> {
    const TITLE: &str = "Could not remove assignment";
    validate_user_id(user_id).map_err(|e| ctx.reject(TITLE, e))?;
    validate_required(&[("assignment id", id)]).map_err(|e| ctx.reject(TITLE, e))?;

    let result = AssignmentEntity::delete_many()
        .filter(assignment::Column::Id.eq(id))
        .filter(assignment::Column::UserId.eq(user_id))
        .exec(&ctx.db)
        .await
        .map_err(|e| ctx.backend_failure(TITLE, "delete assignment", &e))?;

    if result.rows_affected == 0 {
        return Ok(false);
    }

    let metadata = for_logging.map_or_else(
        || json!({ "assignment_id": id }),
        |a| {
            json!({
                "assignment_id": id,
                "owner_id": a.owner_id,
                "property_id": a.property_id,
            })
        },
    );
    ctx.succeed(
        ActivityEntry::new(user_id, "assignment_deleted", "Removed owner from property")
            .with_metadata(metadata),
        "Assignment removed",
        "The owner was unlinked from the property.".to_string(),
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{notify::NoticeLevel, types::Residency},
        errors::ErrorCode,
        test_utils::{
            activity_types_for, create_test_owner, create_test_property, drain_notices,
            setup_test_context,
        },
    };

    #[tokio::test]
    async fn test_assignment_round_trip() -> Result<()> {
        let ctx = setup_test_context().await?;
        let owner = create_test_owner(&ctx, "user-1", "Giulia", "Rossi").await?;
        let property = create_test_property(&ctx, "user-1", "Casa Roma").await?;

        let created = create_assignment(
            &ctx,
            AssignmentInput {
                owner_id: owner.id.clone(),
                property_id: property.id.clone(),
                ownership_percentage: 50.0,
                residency: Residency::default(),
                tax_credits: None,
            },
            "user-1",
        )
        .await?;

        let updated = update_assignment(
            &ctx,
            &created.id,
            AssignmentPatch {
                ownership_percentage: Some(100.0),
                ..Default::default()
            },
            "user-1",
            &created,
        )
        .await?;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.ownership_percentage, 100.0);

        assert!(delete_assignment(&ctx, &updated.id, "user-1", Some(&updated)).await?);
        assert!(get_assignment(&ctx.db, &created.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_assignment_to_unknown_owner_is_foreign_key_violation() -> Result<()> {
        let ctx = setup_test_context().await?;
        let property = create_test_property(&ctx, "user-1", "Casa Roma").await?;

        let result = create_assignment(
            &ctx,
            AssignmentInput {
                owner_id: "missing-owner".to_string(),
                property_id: property.id,
                ownership_percentage: 50.0,
                ..Default::default()
            },
            "user-1",
        )
        .await;

        assert_eq!(
            result.err().and_then(|e| e.code()),
            Some(ErrorCode::ForeignKeyViolation)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_assignment_percentage_must_be_in_range() -> Result<()> {
        let ctx = setup_test_context().await?;
        let result = create_assignment(
            &ctx,
            AssignmentInput {
                owner_id: "o".to_string(),
                property_id: "p".to_string(),
                ownership_percentage: 120.0,
                ..Default::default()
            },
            "user-1",
        )
        .await;
        assert_eq!(
            result.err().and_then(|e| e.code()),
            Some(ErrorCode::InvalidFieldValue)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_owner_cascades_to_assignments() -> Result<()> {
        let ctx = setup_test_context().await?;
        let owner = create_test_owner(&ctx, "user-1", "Giulia", "Rossi").await?;
        let property = create_test_property(&ctx, "user-1", "Casa Roma").await?;
        let created = create_assignment(
            &ctx,
            AssignmentInput {
                owner_id: owner.id.clone(),
                property_id: property.id.clone(),
                ownership_percentage: 100.0,
                ..Default::default()
            },
            "user-1",
        )
        .await?;

        crate::core::owner::delete_owner(&ctx, &owner.id, "user-1", Some(&owner)).await?;

        assert!(get_assignment(&ctx.db, &created.id).await?.is_none());
        Ok(())
    }

    #[test]
    fn test_residency_dates_must_be_ordered() {
        let now = Utc::now();
        let assignment = transform::assignment_from_input(
            "a".to_string(),
            "u",
            AssignmentInput {
                owner_id: "o".to_string(),
                property_id: "p".to_string(),
                ownership_percentage: 10.0,
                residency: Residency {
                    resident_at_property: true,
                    from: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
                    to: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
                },
                tax_credits: None,
            },
            now,
        );
        assert!(validate_assignment_values(&assignment).is_err());
    }

    #[tokio::test]
    async fn test_assignment_mutations_log_activity_and_notify() -> Result<()> {
        let ctx = setup_test_context().await?;
        let owner = create_test_owner(&ctx, "user-1", "Giulia", "Rossi").await?;
        let property = create_test_property(&ctx, "user-1", "Casa Roma").await?;
        let mut notices = ctx.notifier.subscribe();

        let created = create_assignment(
            &ctx,
            AssignmentInput {
                owner_id: owner.id,
                property_id: property.id,
                ownership_percentage: 40.0,
                ..Default::default()
            },
            "user-1",
        )
        .await?;
        let updated = update_assignment(
            &ctx,
            &created.id,
            AssignmentPatch {
                tax_credits: Some(150.0),
                ..Default::default()
            },
            "user-1",
            &created,
        )
        .await?;
        assert!(delete_assignment(&ctx, &updated.id, "user-1", Some(&updated)).await?);

        let assignment_types: Vec<String> = activity_types_for(&ctx, "user-1")
            .await?
            .into_iter()
            .filter(|t| t.starts_with("assignment_"))
            .collect();
        assert_eq!(
            assignment_types,
            ["assignment_created", "assignment_deleted", "assignment_updated"]
        );
        assert_eq!(
            drain_notices(&mut notices),
            [
                (NoticeLevel::Success, "Owner assigned".to_string()),
                (NoticeLevel::Success, "Assignment updated".to_string()),
                (NoticeLevel::Success, "Assignment removed".to_string()),
            ]
        );
        Ok(())
    }
}
