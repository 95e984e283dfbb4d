//! Shared plumbing for the owner, property and assignment CRUD operations.
//!
//! Every mutation validates its input, issues one write, classifies backend
//! failures into a [`DashboardError`], and on success spawns an activity-log
//! write and publishes a notice.

use crate::{
    core::{
        activity::{ActivityEntry, ActivityLogger},
        notify::Notifier,
    },
    errors::{DashboardError, Error, ErrorCode},
};
use sea_orm::{DatabaseConnection, DbErr};
use tracing::error;

/// Everything a mutation needs: the database plus its two side channels.
#[derive(Debug, Clone)]
pub struct CrudContext {
    /// Database connection for all reads and writes
    pub db: DatabaseConnection,
    /// Best-effort audit writer
    pub activity: ActivityLogger,
    /// User-facing notices
    pub notifier: Notifier,
}

impl CrudContext {
    /// Bundles a connection with its activity logger and notifier.
    #[must_use]
    pub const fn new(db: DatabaseConnection, activity: ActivityLogger, notifier: Notifier) -> Self {
        Self {
            db,
            activity,
            notifier,
        }
    }

    /// Publishes an error notice for `error` and wraps it for return.
    pub(crate) fn reject(&self, title: &str, error: DashboardError) -> Error {
        self.notifier.error(title, error.message.clone());
        Error::Dashboard(error)
    }

    /// Classifies a backend failure, publishes it, and wraps it for return.
    pub(crate) fn backend_failure(&self, title: &str, action: &str, err: &DbErr) -> Error {
        error!("Failed to {}: {}", action, err);
        self.reject(title, DashboardError::from_backend_message(&err.to_string(), action))
    }

    /// Spawns the audit write and publishes the success notice.
    pub(crate) fn succeed(&self, entry: ActivityEntry, title: &str, message: String) {
        // Dropping the handle detaches the task.
        drop(self.activity.spawn(entry));
        self.notifier.success(title, message);
    }
}

/// Fails with `MISSING_USER_ID` when the user id is blank.
pub(crate) fn validate_user_id(user_id: &str) -> Result<(), DashboardError> {
    if user_id.trim().is_empty() {
        return Err(DashboardError::new(
            ErrorCode::MissingUserId,
            "You must be signed in to make changes.",
        ));
    }
    Ok(())
}

/// Fails with `MISSING_REQUIRED_FIELDS` naming every blank `(label, value)` pair.
pub(crate) fn validate_required(fields: &[(&str, &str)]) -> Result<(), DashboardError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| *label)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DashboardError::new(
            ErrorCode::MissingRequiredFields,
            format!("Please fill in: {}.", missing.join(", ")),
        ))
    }
}

/// Fails with `INVALID_FIELD_VALUE` carrying `message`.
pub(crate) fn invalid_field(message: impl Into<String>) -> DashboardError {
    DashboardError::new(ErrorCode::InvalidFieldValue, message)
}

/// Fresh UUID v4 for a new record.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("user-1").is_ok());
        let err = validate_user_id("  ").err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::MissingUserId));
    }

    #[test]
    fn test_validate_required_lists_every_missing_field() {
        let err =
            validate_required(&[("first name", ""), ("last name", " "), ("label", "x")]).err();
        let err = err.map(|e| (e.code, e.message));
        assert_eq!(
            err,
            Some((
                ErrorCode::MissingRequiredFields,
                "Please fill in: first name, last name.".to_string()
            ))
        );
    }
}
