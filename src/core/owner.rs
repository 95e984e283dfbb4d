//! Owner business logic - create, update, delete and list owners.

use crate::{
    core::{
        activity::ActivityEntry,
        crud::{CrudContext, new_id, validate_required, validate_user_id},
        transform,
        types::{Owner, OwnerInput, OwnerPatch},
    },
    entities::{Owner as OwnerEntity, owner},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, prelude::*};
use serde_json::json;
use tracing::{debug, instrument};

/// Lists a user's owners, oldest first.
pub async fn list_owners_for_user<C>(db: &C, user_id: &str) -> Result<Vec<Owner>>
where
    C: ConnectionTrait,
{
    let rows = OwnerEntity::find()
        .filter(owner::Column::UserId.eq(user_id))
        .order_by_asc(owner::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(transform::owner_from_row).collect())
}

/// Finds an owner by id.
pub async fn get_owner(db: &DatabaseConnection, id: &str) -> Result<Option<Owner>> {
    Ok(OwnerEntity::find_by_id(id.to_string())
        .one(db)
        .await?
        .map(transform::owner_from_row))
}

/// Creates an owner for `user_id`.
///
/// First and last name are required.
#[instrument(skip(ctx, input))]
pub async fn create_owner(ctx: &CrudContext, input: OwnerInput, user_id: &str) -> Result<Owner> {
    const TITLE: &str = "Could not create owner";
    validate_user_id(user_id).map_err(|e| ctx.reject(TITLE, e))?;
    validate_required(&[
        ("first name", input.first_name.as_str()),
        ("last name", input.last_name.as_str()),
    ])
    .map_err(|e| ctx.reject(TITLE, e))?;

    let owner = transform::owner_from_input(new_id(), user_id, input, Utc::now());
    let row = transform::owner_to_row(&owner)
        .insert(&ctx.db)
        .await
        .map_err(|e| ctx.backend_failure(TITLE, "create owner", &e))?;
    let created = transform::owner_from_row(row);
    debug!("Created owner {}", created.id);

    ctx.succeed(
        ActivityEntry::new(
            user_id,
            "owner_created",
            format!("Created owner {}", created.display_name()),
        )
        .with_metadata(json!({ "owner_id": created.id })),
        "Owner created",
        format!("{} was added.", created.display_name()),
    );
    Ok(created)
}

/// Applies `patch` over `current` and writes the result.
///
/// Only rows owned by `user_id` are updated; a missing row is `NotFound`.
#[instrument(skip(ctx, patch, current))]
pub async fn update_owner(
    ctx: &CrudContext,
    id: &str,
    patch: OwnerPatch,
    user_id: &str,
    current: &Owner,
) -> Result<Owner> {
    const TITLE: &str = "Could not update owner";
    validate_user_id(user_id).map_err(|e| ctx.reject(TITLE, e))?;
    validate_required(&[("owner id", id)]).map_err(|e| ctx.reject(TITLE, e))?;

    let merged = transform::apply_owner_patch(current, patch, Utc::now());
    validate_required(&[
        ("first name", merged.first_name.as_str()),
        ("last name", merged.last_name.as_str()),
    ])
    .map_err(|e| ctx.reject(TITLE, e))?;

    let mut row = transform::owner_to_row(&merged);
    row.id = sea_orm::Set(id.to_string());
    row.user_id = sea_orm::Set(user_id.to_string());
    let updated = OwnerEntity::update(row)
        .filter(owner::Column::UserId.eq(user_id))
        .exec(&ctx.db)
        .await
        .map_err(|e| match e {
            DbErr::RecordNotUpdated => Error::NotFound {
                entity: "owner",
                id: id.to_string(),
            },
            other => ctx.backend_failure(TITLE, "update owner", &other),
        })?;
    let updated = transform::owner_from_row(updated);

    ctx.succeed(
        ActivityEntry::new(
            user_id,
            "owner_updated",
            format!("Updated owner {}", updated.display_name()),
        )
        .with_metadata(json!({ "owner_id": updated.id })),
        "Owner updated",
        format!("{} was saved.", updated.display_name()),
    );
    Ok(updated)
}

/// Deletes an owner. Returns `false` when no matching row existed.
///
/// Assignments of the owner are removed by the foreign key cascade.
#[instrument(skip(ctx, for_logging))]
pub async fn delete_owner(
    ctx: &CrudContext,
    id: &str,
    user_id: &str,
    for_logging: Option<&Owner>,
) -> Result<bool> {
    const TITLE: &str = "Could not delete owner";
    validate_user_id(user_id).map_err(|e| ctx.reject(TITLE, e))?;
    validate_required(&[("owner id", id)]).map_err(|e| ctx.reject(TITLE, e))?;

    let result = OwnerEntity::delete_many()
        .filter(owner::Column::Id.eq(id))
        .filter(owner::Column::UserId.eq(user_id))
        .exec(&ctx.db)
        .await
        .map_err(|e| ctx.backend_failure(TITLE, "delete owner", &e))?;

    if result.rows_affected == 0 {
        debug!("No owner {} for user {}", id, user_id);
        return Ok(false);
    }

    let name = for_logging.map_or_else(|| id.to_string(), Owner::display_name);
    ctx.succeed(
        ActivityEntry::new(user_id, "owner_deleted", format!("Deleted owner {name}"))
            .with_metadata(json!({ "owner_id": id })),
        "Owner deleted",
        format!("{name} was removed."),
    );
    Ok(true)
}
