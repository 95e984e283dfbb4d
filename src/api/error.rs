//! JSON error responses for the admin API.

use crate::errors::{Error, ErrorCode};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Wraps a crate [`Error`] so handlers can return it with `?`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

const fn dashboard_status(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::MissingUserId | ErrorCode::MissingRequiredFields => StatusCode::BAD_REQUEST,
        ErrorCode::InvalidFieldValue => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorCode::DuplicateRecord | ErrorCode::ForeignKeyViolation => StatusCode::CONFLICT,
        ErrorCode::SessionExpired => StatusCode::UNAUTHORIZED,
        ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    /// Status, code and message for the response.
    fn parts(&self) -> (StatusCode, String, String) {
        match &self.0 {
            Error::Dashboard(e) => (
                dashboard_status(e.code),
                e.code.as_str().to_string(),
                e.message.clone(),
            ),
            Error::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND".to_string(),
                self.0.to_string(),
            ),
            Error::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED".to_string(),
                message.clone(),
            ),
            Error::InvalidStateTransition { .. } => (
                StatusCode::CONFLICT,
                "INVALID_STATE_TRANSITION".to_string(),
                self.0.to_string(),
            ),
            Error::FetchExhausted { .. } => (
                StatusCode::BAD_GATEWAY,
                "FETCH_EXHAUSTED".to_string(),
                self.0.to_string(),
            ),
            Error::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseError.as_str().to_string(),
                "A database error occurred. Please try again.".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                "An internal error occurred.".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(ErrorBody { code, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DashboardError;

    #[test]
    fn test_dashboard_codes_map_to_statuses() {
        let err = ApiError(Error::Dashboard(DashboardError::new(
            ErrorCode::ForeignKeyViolation,
            "missing owner",
        )));
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "FOREIGN_KEY_VIOLATION");
        assert_eq!(message, "missing owner");
    }

    #[test]
    fn test_database_errors_hide_details() {
        let err = ApiError(Error::Database(sea_orm::DbErr::Custom(
            "connection refused at 10.0.0.3".to_string(),
        )));
        let (status, _, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("10.0.0.3"));
    }

    #[test]
    fn test_exhausted_fetch_is_bad_gateway() {
        let err = ApiError(Error::FetchExhausted {
            what: "payments".to_string(),
        });
        assert_eq!(err.parts().0, StatusCode::BAD_GATEWAY);
    }
}
