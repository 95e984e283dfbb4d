//! Shared test utilities for the intake dashboard.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    core::{
        activity::{ActivityLogger, DEFAULT_BUFFER_CAPACITY},
        crud::CrudContext,
        notify::{Notice, NoticeLevel, Notifier},
        owner, property,
        types::{Owner, OwnerInput, Property, PropertyInput},
    },
    entities::{SubmissionState, UserActivity, form_submission, profile, purchase, user_activity},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::sync::broadcast;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an in-memory `SQLite` database with no tables at all.
/// Every query against it fails, which is how tests exercise backend errors.
pub async fn setup_failing_test_db() -> Result<DatabaseConnection> {
    Ok(sea_orm::Database::connect("sqlite::memory:").await?)
}

/// Creates a test database wrapped in a [`CrudContext`] with a default-sized
/// activity buffer and notifier.
pub async fn setup_test_context() -> Result<CrudContext> {
    let db = setup_test_db().await?;
    let activity = ActivityLogger::new(db.clone(), DEFAULT_BUFFER_CAPACITY);
    Ok(CrudContext::new(db, activity, Notifier::default()))
}

/// Waits for detached activity writes, then returns the user's activity
/// types in sorted order.
pub async fn activity_types_for(ctx: &CrudContext, user_id: &str) -> Result<Vec<String>> {
    ctx.activity.flush().await;
    let mut types: Vec<String> = UserActivity::find()
        .filter(user_activity::Column::UserId.eq(user_id))
        .all(&ctx.db)
        .await?
        .into_iter()
        .map(|a| a.activity_type)
        .collect();
    types.sort();
    Ok(types)
}

/// Drains every notice published so far as `(level, title)` pairs.
pub fn drain_notices(notices: &mut broadcast::Receiver<Notice>) -> Vec<(NoticeLevel, String)> {
    std::iter::from_fn(|| notices.try_recv().ok())
        .map(|n| (n.level, n.title))
        .collect()
}

/// Creates a test owner with only the required names filled in.
pub async fn create_test_owner(
    ctx: &CrudContext,
    user_id: &str,
    first_name: &str,
    last_name: &str,
) -> Result<Owner> {
    owner::create_owner(
        ctx,
        OwnerInput {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Default::default()
        },
        user_id,
    )
    .await
}

/// Creates a residential test property with the given label.
pub async fn create_test_property(
    ctx: &CrudContext,
    user_id: &str,
    label: &str,
) -> Result<Property> {
    property::create_property(
        ctx,
        PropertyInput {
            label: label.to_string(),
            ..Default::default()
        },
        user_id,
    )
    .await
}

/// Inserts a profile row directly.
pub async fn insert_test_profile(
    db: &DatabaseConnection,
    id: &str,
    email: &str,
) -> Result<profile::Model> {
    Ok(profile::ActiveModel {
        id: Set(id.to_string()),
        email: Set(email.to_string()),
        full_name: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?)
}

/// Inserts a submission row directly, bypassing primary demotion.
pub async fn insert_test_submission(
    db: &DatabaseConnection,
    id: &str,
    user_id: &str,
    state: SubmissionState,
    is_primary: bool,
) -> Result<form_submission::Model> {
    let now = Utc::now();
    Ok(form_submission::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(user_id.to_string()),
        state: Set(state),
        is_primary: Set(is_primary),
        pdf_url: Set(None),
        snapshot: Set("{}".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?)
}

/// Inserts a completed purchase the way the payment webhook would.
///
/// # Defaults
/// * `currency`: "eur"
/// * `status`: "completed"
/// * `created_at`: now
pub async fn insert_test_purchase(
    db: &DatabaseConnection,
    id: &str,
    user_id: Option<&str>,
    form_submission_id: Option<&str>,
    amount: Option<f64>,
) -> Result<purchase::Model> {
    Ok(purchase::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(user_id.map(str::to_string)),
        form_submission_id: Set(form_submission_id.map(str::to_string)),
        amount: Set(amount),
        currency: Set("eur".to_string()),
        status: Set(crate::core::payments::STATUS_COMPLETED.to_string()),
        checkout_session_id: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?)
}

/// Inserts an unlinked purchase with a custom status and timestamp.
/// Use this when testing time windows or payment verification.
pub async fn insert_test_purchase_at(
    db: &DatabaseConnection,
    id: &str,
    amount: Option<f64>,
    status: &str,
    created_at: DateTime<Utc>,
) -> Result<purchase::Model> {
    Ok(purchase::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(None),
        form_submission_id: Set(None),
        amount: Set(amount),
        currency: Set("eur".to_string()),
        status: Set(status.to_string()),
        checkout_session_id: Set(None),
        created_at: Set(created_at),
    }
    .insert(db)
    .await?)
}
