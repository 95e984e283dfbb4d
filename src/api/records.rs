//! Owner, property and assignment routes, scoped to one user.
//!
//! Updates and deletes load the current record first and treat a record of
//! another user as missing.

use crate::{
    api::{AppState, error::ApiError},
    core::{
        assignment, owner, property,
        types::{
            AssignmentInput, AssignmentPatch, Owner, OwnerInput, OwnerPatch,
            OwnerPropertyAssignment, Property, PropertyInput, PropertyPatch,
        },
    },
    errors::Error,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// A record that belongs to exactly one user
trait UserOwned {
    const ENTITY: &'static str;
    fn user_id(&self) -> &str;
}

impl UserOwned for Owner {
    const ENTITY: &'static str = "owner";
    fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl UserOwned for Property {
    const ENTITY: &'static str = "property";
    fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl UserOwned for OwnerPropertyAssignment {
    const ENTITY: &'static str = "assignment";
    fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Keeps `record` only if it belongs to `user_id`.
fn owned_by<T: UserOwned>(record: Option<T>, user_id: &str, id: &str) -> Result<T, ApiError> {
    record
        .filter(|r| r.user_id() == user_id)
        .ok_or_else(|| {
            ApiError(Error::NotFound {
                entity: T::ENTITY,
                id: id.to_string(),
            })
        })
}

fn deleted(found: bool, entity: &'static str, id: &str) -> Result<StatusCode, ApiError> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError(Error::NotFound {
            entity,
            id: id.to_string(),
        }))
    }
}

/// `GET /admin/users/{user_id}/owners`
pub async fn list_owners(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Owner>>, ApiError> {
    Ok(Json(owner::list_owners_for_user(&state.ctx.db, &user_id).await?))
}

/// `POST /admin/users/{user_id}/owners`
pub async fn create_owner(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(input): Json<OwnerInput>,
) -> Result<(StatusCode, Json<Owner>), ApiError> {
    let created = owner::create_owner(&state.ctx, input, &user_id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /admin/users/{user_id}/owners/{id}`
pub async fn update_owner(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
    Json(patch): Json<OwnerPatch>,
) -> Result<Json<Owner>, ApiError> {
    let current = owned_by(owner::get_owner(&state.ctx.db, &id).await?, &user_id, &id)?;
    let updated = owner::update_owner(&state.ctx, &id, patch, &user_id, &current).await?;
    Ok(Json(updated))
}

/// `DELETE /admin/users/{user_id}/owners/{id}`
pub async fn delete_owner(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let current = owner::get_owner(&state.ctx.db, &id).await?;
    let found = owner::delete_owner(&state.ctx, &id, &user_id, current.as_ref()).await?;
    deleted(found, Owner::ENTITY, &id)
}

/// `GET /admin/users/{user_id}/properties`
pub async fn list_properties(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Property>>, ApiError> {
    Ok(Json(
        property::list_properties_for_user(&state.ctx.db, &user_id).await?,
    ))
}

/// `POST /admin/users/{user_id}/properties`
pub async fn create_property(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(input): Json<PropertyInput>,
) -> Result<(StatusCode, Json<Property>), ApiError> {
    let created = property::create_property(&state.ctx, input, &user_id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /admin/users/{user_id}/properties/{id}`
pub async fn update_property(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
    Json(patch): Json<PropertyPatch>,
) -> Result<Json<Property>, ApiError> {
    let current = owned_by(property::get_property(&state.ctx.db, &id).await?, &user_id, &id)?;
    let updated = property::update_property(&state.ctx, &id, patch, &user_id, &current).await?;
    Ok(Json(updated))
}

/// `DELETE /admin/users/{user_id}/properties/{id}`
pub async fn delete_property(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let current = property::get_property(&state.ctx.db, &id).await?;
    let found = property::delete_property(&state.ctx, &id, &user_id, current.as_ref()).await?;
    deleted(found, Property::ENTITY, &id)
}

/// `GET /admin/users/{user_id}/assignments`
pub async fn list_assignments(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<OwnerPropertyAssignment>>, ApiError> {
    Ok(Json(
        assignment::list_assignments_for_user(&state.ctx.db, &user_id).await?,
    ))
}

/// `POST /admin/users/{user_id}/assignments`
pub async fn create_assignment(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(input): Json<AssignmentInput>,
) -> Result<(StatusCode, Json<OwnerPropertyAssignment>), ApiError> {
    let created = assignment::create_assignment(&state.ctx, input, &user_id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /admin/users/{user_id}/assignments/{id}`
pub async fn update_assignment(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
    Json(patch): Json<AssignmentPatch>,
) -> Result<Json<OwnerPropertyAssignment>, ApiError> {
    let current = owned_by(
        assignment::get_assignment(&state.ctx.db, &id).await?,
        &user_id,
        &id,
    )?;
    let updated =
        assignment::update_assignment(&state.ctx, &id, patch, &user_id, &current).await?;
    Ok(Json(updated))
}

/// `DELETE /admin/users/{user_id}/assignments/{id}`
pub async fn delete_assignment(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let current = assignment::get_assignment(&state.ctx.db, &id).await?;
    let found =
        assignment::delete_assignment(&state.ctx, &id, &user_id, current.as_ref()).await?;
    deleted(found, OwnerPropertyAssignment::ENTITY, &id)
}
