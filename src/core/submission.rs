//! Form submission business logic.
//!
//! A submission is created in state `new` when the intake form is completed,
//! then moves through processing to `completed` (PDF generated) or `error`.
//! At most one submission per user is primary; creating a new primary one
//! demotes the previous one in the same transaction.

use crate::{
    core::{
        activity::ActivityEntry,
        crud::{CrudContext, validate_required, validate_user_id},
    },
    entities::{FormSubmission, SubmissionState, form_submission},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde_json::json;
use tracing::{debug, info, instrument};

/// Whether a submission may move from `from` to `to`.
///
/// `error -> processing` is the retry path; completed submissions are final.
#[must_use]
pub const fn can_transition(from: SubmissionState, to: SubmissionState) -> bool {
    matches!(
        (from, to),
        (SubmissionState::New, SubmissionState::Processing | SubmissionState::Error)
            | (
                SubmissionState::Processing,
                SubmissionState::Completed | SubmissionState::Error
            )
            | (SubmissionState::Error, SubmissionState::Processing)
    )
}

/// Lists a user's submissions, newest first.
pub async fn list_submissions_for_user<C>(
    db: &C,
    user_id: &str,
) -> Result<Vec<form_submission::Model>>
where
    C: ConnectionTrait,
{
    FormSubmission::find()
        .filter(form_submission::Column::UserId.eq(user_id))
        .order_by_desc(form_submission::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a submission by id.
pub async fn get_submission(
    db: &DatabaseConnection,
    id: &str,
) -> Result<Option<form_submission::Model>> {
    FormSubmission::find_by_id(id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Records a completed intake form.
#[instrument(skip(ctx, snapshot))]
pub async fn create_submission(
    ctx: &CrudContext,
    user_id: &str,
    snapshot: &serde_json::Value,
    is_primary: bool,
) -> Result<form_submission::Model> {
    const TITLE: &str = "Could not save submission";
    validate_user_id(user_id).map_err(|e| ctx.reject(TITLE, e))?;

    let now = Utc::now();
    let txn = ctx.db.begin().await?;

    if is_primary {
        FormSubmission::update_many()
            .col_expr(form_submission::Column::IsPrimary, Expr::value(false))
            .col_expr(form_submission::Column::UpdatedAt, Expr::value(now))
            .filter(form_submission::Column::UserId.eq(user_id))
            .filter(form_submission::Column::IsPrimary.eq(true))
            .exec(&txn)
            .await
            .map_err(|e| ctx.backend_failure(TITLE, "save submission", &e))?;
    }

    let created = form_submission::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        state: Set(SubmissionState::New),
        is_primary: Set(is_primary),
        pdf_url: Set(None),
        snapshot: Set(snapshot.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(|e| ctx.backend_failure(TITLE, "save submission", &e))?;

    txn.commit().await?;
    info!("Submission {} created for user {}", created.id, user_id);

    ctx.succeed(
        ActivityEntry::new(user_id, "submission_created", "Submitted the intake form")
            .with_metadata(json!({ "submission_id": created.id, "is_primary": is_primary })),
        "Form submitted",
        "Your information was submitted.".to_string(),
    );
    Ok(created)
}

/// Moves a submission to `next`, enforcing [`can_transition`].
#[instrument(skip(ctx))]
pub async fn transition_state(
    ctx: &CrudContext,
    id: &str,
    next: SubmissionState,
) -> Result<form_submission::Model> {
    const TITLE: &str = "Could not update submission";
    let current = get_submission(&ctx.db, id)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "submission",
            id: id.to_string(),
        })?;

    if current.state == next {
        debug!("Submission {} already {}", id, next);
        return Ok(current);
    }
    if !can_transition(current.state, next) {
        return Err(Error::InvalidStateTransition {
            from: current.state.to_string(),
            to: next.to_string(),
        });
    }

    let user_id = current.user_id.clone();
    let previous = current.state;
    let mut active: form_submission::ActiveModel = current.into();
    active.state = Set(next);
    active.updated_at = Set(Utc::now());
    let updated = active
        .update(&ctx.db)
        .await
        .map_err(|e| ctx.backend_failure(TITLE, "update submission", &e))?;

    ctx.succeed(
        ActivityEntry::new(
            user_id,
            "submission_state_changed",
            format!("Submission moved from {previous} to {next}"),
        )
        .with_metadata(json!({ "submission_id": id, "from": previous, "to": next })),
        "Submission updated",
        format!("The submission is now {next}."),
    );
    Ok(updated)
}

/// Records the reference of the generated PDF.
#[instrument(skip(ctx))]
pub async fn attach_pdf(
    ctx: &CrudContext,
    id: &str,
    pdf_url: &str,
) -> Result<form_submission::Model> {
    const TITLE: &str = "Could not attach PDF";
    validate_required(&[("PDF reference", pdf_url)]).map_err(|e| ctx.reject(TITLE, e))?;

    let current = get_submission(&ctx.db, id)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "submission",
            id: id.to_string(),
        })?;

    let mut active: form_submission::ActiveModel = current.into();
    active.pdf_url = Set(Some(pdf_url.trim().to_string()));
    active.updated_at = Set(Utc::now());
    let updated = active
        .update(&ctx.db)
        .await
        .map_err(|e| ctx.backend_failure(TITLE, "attach PDF", &e))?;

    ctx.notifier.success("PDF ready", "The summary PDF was generated.");
    Ok(updated)
}
