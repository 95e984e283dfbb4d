//! Property business logic - create, update, delete and list properties.

use crate::{
    core::{
        activity::ActivityEntry,
        crud::{CrudContext, invalid_field, new_id, validate_required, validate_user_id},
        transform,
        types::{OccupancyAllocation, Property, PropertyInput, PropertyPatch},
    },
    entities::{Property as PropertyEntity, property},
    errors::{DashboardError, Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde_json::json;
use tracing::{debug, instrument};

/// Months in the tax year an occupancy allocation can cover
pub const MONTHS_PER_YEAR: u8 = 12;

/// Checks occupancy months and money fields of a property.
///
/// Each allocation covers 0-12 months and together they cover at most 12.
pub fn validate_property_values(property: &Property) -> std::result::Result<(), DashboardError> {
    validate_occupancy(&property.occupancy)?;

    let amounts = [
        ("purchase price", property.transfer.purchase_price),
        ("sale price", property.transfer.sale_price),
        ("rental income", property.rental_income),
    ];
    for (label, amount) in amounts {
        if let Some(value) = amount {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid_field(format!(
                    "The {label} must be a non-negative amount."
                )));
            }
        }
    }
    Ok(())
}

fn validate_occupancy(
    occupancy: &[OccupancyAllocation],
) -> std::result::Result<(), DashboardError> {
    if occupancy.iter().any(|a| a.months > MONTHS_PER_YEAR) {
        return Err(invalid_field(
            "Each occupancy period must cover between 0 and 12 months.",
        ));
    }
    let total: u32 = occupancy.iter().map(|a| u32::from(a.months)).sum();
    if total > u32::from(MONTHS_PER_YEAR) {
        return Err(invalid_field(format!(
            "Occupancy periods add up to {total} months; a year has 12."
        )));
    }
    Ok(())
}

/// Lists a user's properties, oldest first.
pub async fn list_properties_for_user<C>(db: &C, user_id: &str) -> Result<Vec<Property>>
where
    C: ConnectionTrait,
{
    let rows = PropertyEntity::find()
        .filter(property::Column::UserId.eq(user_id))
        .order_by_asc(property::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(transform::property_from_row).collect())
}

/// Finds a property by id.
pub async fn get_property(db: &DatabaseConnection, id: &str) -> Result<Option<Property>> {
    Ok(PropertyEntity::find_by_id(id.to_string())
        .one(db)
        .await?
        .map(transform::property_from_row))
}

/// Creates a property for `user_id`. The label is required.
#[instrument(skip(ctx, input))]
pub async fn create_property(
    ctx: &CrudContext,
    input: PropertyInput,
    user_id: &str,
) -> Result<Property> {
    const TITLE: &str = "Could not create property";
    validate_user_id(user_id).map_err(|e| ctx.reject(TITLE, e))?;
    validate_required(&[("property label", input.label.as_str())])
        .map_err(|e| ctx.reject(TITLE, e))?;

    let property = transform::property_from_input(new_id(), user_id, input, Utc::now());
    validate_property_values(&property).map_err(|e| ctx.reject(TITLE, e))?;

    let row = transform::property_to_row(&property)?
        .insert(&ctx.db)
        .await
        .map_err(|e| ctx.backend_failure(TITLE, "create property", &e))?;
    let created = transform::property_from_row(row);
    debug!("Created property {}", created.id);

    ctx.succeed(
        ActivityEntry::new(
            user_id,
            "property_created",
            format!("Created property {}", created.label),
        )
        .with_metadata(json!({ "property_id": created.id })),
        "Property created",
        format!("{} was added.", created.label),
    );
    Ok(created)
}

/// Applies `patch` over `current` and writes the result.
#[instrument(skip(ctx, patch, current))]
pub async fn update_property(
    ctx: &CrudContext,
    id: &str,
    patch: PropertyPatch,
    user_id: &str,
    current: &Property,
) -> Result<Property> {
    const TITLE: &str = "Could not update property";
    validate_user_id(user_id).map_err(|e| ctx.reject(TITLE, e))?;
    validate_required(&[("property id", id)]).map_err(|e| ctx.reject(TITLE, e))?;

    let merged = transform::apply_property_patch(current, patch, Utc::now());
    validate_required(&[("property label", merged.label.as_str())])
        .map_err(|e| ctx.reject(TITLE, e))?;
    validate_property_values(&merged).map_err(|e| ctx.reject(TITLE, e))?;

    let mut row = transform::property_to_row(&merged)?;
    row.id = Set(id.to_string());
    row.user_id = Set(user_id.to_string());
    let updated = PropertyEntity::update(row)
        .filter(property::Column::UserId.eq(user_id))
        .exec(&ctx.db)
        .await
        .map_err(|e| match e {
            DbErr::RecordNotUpdated => Error::NotFound {
                entity: "property",
                id: id.to_string(),
            },
            other => ctx.backend_failure(TITLE, "update property", &other),
        })?;
    let updated = transform::property_from_row(updated);

    ctx.succeed(
        ActivityEntry::new(
            user_id,
            "property_updated",
            format!("Updated property {}", updated.label),
        )
        .with_metadata(json!({ "property_id": updated.id })),
        "Property updated",
        format!("{} was saved.", updated.label),
    );
    Ok(updated)
}

/// Deletes a property. Returns `false` when no matching row existed.
#[instrument(skip(ctx, for_logging))]
pub async fn delete_property(
    ctx: &CrudContext,
    id: &str,
    user_id: &str,
    for_logging: Option<&Property>,
) -> Result<bool> {
    const TITLE: &str = "Could not delete property";
    validate_user_id(user_id).map_err(|e| ctx.reject(TITLE, e))?;
    validate_required(&[("property id", id)]).map_err(|e| ctx.reject(TITLE, e))?;

    let result = PropertyEntity::delete_many()
        .filter(property::Column::Id.eq(id))
        .filter(property::Column::UserId.eq(user_id))
        .exec(&ctx.db)
        .await
        .map_err(|e| ctx.backend_failure(TITLE, "delete property", &e))?;

    if result.rows_affected == 0 {
        return Ok(false);
    }

    let label = for_logging.map_or_else(|| id.to_string(), |p| p.label.clone());
    ctx.succeed(
        ActivityEntry::new(user_id, "property_deleted", format!("Deleted property {label}"))
            .with_metadata(json!({ "property_id": id })),
        "Property deleted",
        format!("{label} was removed."),
    );
    Ok(true)
}
