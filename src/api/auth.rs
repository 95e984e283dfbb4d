//! Admin login, logout and the session middleware.

use crate::{
    api::{AppState, error::ApiError},
    core::admin::{self, AdminLogin},
    errors::Error,
};
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

/// Header carrying the admin session token
pub const SESSION_HEADER: &str = "x-admin-session-token";

/// Body of `POST /admin/login`
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn session_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError(Error::Unauthorized {
                message: "Missing admin session token".to_string(),
            })
        })
}

/// Rejects requests without a live admin session.
///
/// The resolved admin is stored in the request extensions.
pub async fn require_admin_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(request.headers())?.to_string();
    let admin = admin::verify_session(&state.ctx.db, &token, Utc::now()).await?;
    debug!(admin = %admin.email, path = %request.uri().path(), "Admin request");
    request.extensions_mut().insert(admin);
    Ok(next.run(request).await)
}

/// `POST /admin/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AdminLogin>, ApiError> {
    let session =
        admin::login(&state.ctx.db, &body.email, &body.password, state.session_ttl).await?;
    Ok(Json(session))
}

/// `POST /admin/logout`
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = session_token(&headers)?;
    admin::logout(&state.ctx.db, token).await?;
    Ok(StatusCode::NO_CONTENT)
}
