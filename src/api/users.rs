//! User list and account detail routes.

use crate::{
    api::{AppState, error::ApiError},
    core::{
        account::{AccountDetails, AssignmentView, fetch_account_details},
        admin::{self, UserSummary},
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

/// Account details plus display-ready assignment rows
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    #[serde(flatten)]
    pub details: AccountDetails,
    pub assignment_views: Vec<AssignmentView>,
}

/// `GET /admin/users`
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(admin::list_user_summaries(&state.ctx.db).await?))
}

/// `GET /admin/users/{user_id}`
pub async fn get_account(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let details = fetch_account_details(&state.ctx.db, &user_id).await?;
    let assignment_views = details.assignment_views();
    Ok(Json(AccountResponse {
        details,
        assignment_views,
    }))
}

/// `DELETE /admin/users/{user_id}`
pub async fn delete_account(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    admin::delete_user_account(&state.ctx, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
