//! Unified error types for the intake dashboard.
//!
//! Backend failures raised by the CRUD layer are classified into a
//! [`DashboardError`] carrying a machine-readable [`ErrorCode`] and a message
//! that can be shown to the user as-is.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Machine-readable error codes surfaced to dashboard clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The caller did not provide a user id
    MissingUserId,
    /// One or more required fields are empty, or the database rejected a NULL
    MissingRequiredFields,
    /// A field has a value outside its allowed range
    InvalidFieldValue,
    /// Row-level security rejected the write
    PermissionDenied,
    /// Unique constraint violation
    DuplicateRecord,
    /// The record references a row that does not exist
    ForeignKeyViolation,
    /// The caller's session token has expired
    SessionExpired,
    /// Any other backend failure
    DatabaseError,
}

impl ErrorCode {
    /// Returns the wire representation of the code, e.g. `MISSING_USER_ID`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingUserId => "MISSING_USER_ID",
            Self::MissingRequiredFields => "MISSING_REQUIRED_FIELDS",
            Self::InvalidFieldValue => "INVALID_FIELD_VALUE",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::DuplicateRecord => "DUPLICATE_RECORD",
            Self::ForeignKeyViolation => "FOREIGN_KEY_VIOLATION",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-facing failure of a dashboard operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message} ({code})")]
pub struct DashboardError {
    /// Machine-readable classification
    pub code: ErrorCode,
    /// Message suitable for display
    pub message: String,
}

impl DashboardError {
    /// Creates a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Classifies a raw backend error message into a user-facing error.
    ///
    /// Matching is case-insensitive and recognises both PostgreSQL and SQLite
    /// phrasing. `action` names what was being attempted, e.g. "create owner".
    #[must_use]
    pub fn from_backend_message(raw: &str, action: &str) -> Self {
        let lower = raw.to_lowercase();

        if lower.contains("row-level security") || lower.contains("row level security") {
            Self::new(
                ErrorCode::PermissionDenied,
                format!("You do not have permission to {action}. Please sign in again."),
            )
        } else if lower.contains("duplicate key") || lower.contains("unique constraint") {
            Self::new(
                ErrorCode::DuplicateRecord,
                format!("Could not {action}: a matching record already exists."),
            )
        } else if lower.contains("foreign key") {
            Self::new(
                ErrorCode::ForeignKeyViolation,
                format!("Could not {action}: it references a record that no longer exists."),
            )
        } else if lower.contains("not-null") || lower.contains("not null") {
            Self::new(
                ErrorCode::MissingRequiredFields,
                format!("Could not {action}: a required field is missing."),
            )
        } else if lower.contains("jwt expired") || lower.contains("token expired") {
            Self::new(
                ErrorCode::SessionExpired,
                "Your session has expired. Please sign in again.",
            )
        } else {
            Self::new(
                ErrorCode::DatabaseError,
                format!("Could not {action}. Please try again."),
            )
        }
    }
}

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Database driver or ORM failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Validation or classified backend failure of a dashboard operation
    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    /// A record that must exist was not found
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record, e.g. "owner"
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Missing, wrong or expired admin credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Reason shown to the caller
        message: String,
    },

    /// A submission state change that is not allowed
    #[error("Invalid submission state transition: {from} -> {to}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Requested state
        to: String,
    },

    /// Every retrieval strategy for a piece of data failed
    #[error("All retrieval strategies failed for {what}")]
    FetchExhausted {
        /// The data that could not be fetched
        what: String,
    },

    /// JSON (de)serialization of stored columns
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Returns the dashboard error code when this is a dashboard failure.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Dashboard(e) => Some(e.code),
            _ => None,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
