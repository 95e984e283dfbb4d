//! Submission processing and payment verification routes.

use crate::{
    api::{AppState, error::ApiError},
    core::{admin, submission},
    entities::{SubmissionState, form_submission, purchase},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

/// Body of `POST /admin/users/{user_id}/submissions`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    /// The completed intake form as entered
    pub snapshot: serde_json::Value,
    #[serde(default)]
    pub is_primary: bool,
}

/// Body of `POST /admin/submissions/{id}/state`
#[derive(Debug, Deserialize)]
pub struct StateChange {
    pub state: SubmissionState,
}

/// Body of `POST /admin/submissions/{id}/pdf`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfAttachment {
    pub pdf_url: String,
}

/// `GET /admin/users/{user_id}/submissions`
pub async fn list_submissions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<form_submission::Model>>, ApiError> {
    Ok(Json(
        submission::list_submissions_for_user(&state.ctx.db, &user_id).await?,
    ))
}

/// `POST /admin/users/{user_id}/submissions`
pub async fn create_submission(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<NewSubmission>,
) -> Result<(StatusCode, Json<form_submission::Model>), ApiError> {
    let created =
        submission::create_submission(&state.ctx, &user_id, &body.snapshot, body.is_primary)
            .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /admin/submissions/{id}/state`
pub async fn change_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StateChange>,
) -> Result<Json<form_submission::Model>, ApiError> {
    Ok(Json(
        submission::transition_state(&state.ctx, &id, body.state).await?,
    ))
}

/// `POST /admin/submissions/{id}/pdf`
pub async fn attach_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PdfAttachment>,
) -> Result<Json<form_submission::Model>, ApiError> {
    Ok(Json(
        submission::attach_pdf(&state.ctx, &id, &body.pdf_url).await?,
    ))
}

/// `POST /admin/purchases/{id}/verify`
pub async fn verify_purchase(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<purchase::Model>, ApiError> {
    Ok(Json(admin::verify_payment(&state.ctx, &id).await?))
}
