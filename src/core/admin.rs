//! Administrative operations: admin login sessions and account tooling.
//!
//! Admin credentials are separate from regular user accounts. A successful
//! login issues an opaque session token that the HTTP layer expects in the
//! `x-admin-session-token` header.

use crate::{
    core::{
        activity::ActivityEntry,
        crud::CrudContext,
        payments::{STATUS_COMPLETED, STATUS_PENDING, validate_purchase},
    },
    entities::{
        AdminCredential, AdminSession, Assignment, FormSubmission, Owner, Profile, Property,
        Purchase, SubmissionState, UserActivity, admin_credential, admin_session, assignment,
        form_submission, owner, profile, property, purchase, user_activity,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

const INVALID_LOGIN: &str = "Invalid email or password";

fn digest_hex(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hashes `password` with a fresh random salt as `salt$hex`.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{salt}${}", digest_hex(&salt, password))
}

/// Checks `password` against a `salt$hex` hash. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let actual = digest_hex(salt, password);
    actual.len() == expected.len()
        && actual
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Creates the admin `email`, or resets its password and reactivates it.
#[instrument(skip(db, password))]
pub async fn ensure_admin(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<admin_credential::Model> {
    let email = email.trim().to_lowercase();
    let existing = AdminCredential::find()
        .filter(admin_credential::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;

    let admin = match existing {
        Some(current) => {
            let mut active: admin_credential::ActiveModel = current.into();
            active.password_hash = Set(hash_password(password));
            active.is_active = Set(true);
            let updated = active.update(db).await?;
            info!("Refreshed admin credential for {}", email);
            updated
        }
        None => {
            let created = admin_credential::ActiveModel {
                id: Set(uuid::Uuid::new_v4().to_string()),
                email: Set(email.clone()),
                password_hash: Set(hash_password(password)),
                is_active: Set(true),
                last_login_at: Set(None),
                created_at: Set(Utc::now()),
            }
            .insert(db)
            .await?;
            info!("Created admin credential for {}", email);
            created
        }
    };
    Ok(admin)
}

/// A freshly issued admin session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLogin {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub admin: admin_credential::Model,
}

/// Checks the credentials and opens a session valid for `ttl`.
///
/// Unknown emails, wrong passwords and deactivated admins all fail with the
/// same [`Error::Unauthorized`] message.
#[instrument(skip(db, password))]
pub async fn login(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    ttl: Duration,
) -> Result<AdminLogin> {
    let unauthorized = || Error::Unauthorized {
        message: INVALID_LOGIN.to_string(),
    };

    let admin = AdminCredential::find()
        .filter(admin_credential::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?
        .ok_or_else(unauthorized)?;
    if !admin.is_active || !verify_password(password, &admin.password_hash) {
        warn!("Rejected admin login for {}", admin.email);
        return Err(unauthorized());
    }

    let now = Utc::now();
    let session = admin_session::ActiveModel {
        token: Set(uuid::Uuid::new_v4().simple().to_string()),
        admin_id: Set(admin.id.clone()),
        expires_at: Set(now + ttl),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    let mut active: admin_credential::ActiveModel = admin.into();
    active.last_login_at = Set(Some(now));
    let admin = active.update(db).await?;
    info!("Admin {} logged in", admin.email);

    Ok(AdminLogin {
        token: session.token,
        expires_at: session.expires_at,
        admin,
    })
}

/// Resolves a session token to its admin.
///
/// Expired sessions are deleted on sight.
pub async fn verify_session(
    db: &DatabaseConnection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<admin_credential::Model> {
    let session = AdminSession::find_by_id(token.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::Unauthorized {
            message: "Unknown admin session".to_string(),
        })?;

    if session.expires_at <= now {
        debug!("Admin session expired at {}", session.expires_at);
        AdminSession::delete_by_id(session.token).exec(db).await?;
        return Err(Error::Unauthorized {
            message: "Admin session expired".to_string(),
        });
    }

    match AdminCredential::find_by_id(session.admin_id).one(db).await? {
        Some(admin) if admin.is_active => Ok(admin),
        _ => Err(Error::Unauthorized {
            message: "Admin account is not active".to_string(),
        }),
    }
}

/// Ends a session. Returns `false` when the token was unknown.
pub async fn logout(db: &DatabaseConnection, token: &str) -> Result<bool> {
    let result = AdminSession::delete_by_id(token.to_string())
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// One row of the admin user list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub submission_count: usize,
    pub has_completed_setup: bool,
    /// Completed payments linked to the user directly or via a submission
    pub total_paid: f64,
}

/// Lists every user with submission and payment totals, newest first.
#[instrument(skip(db))]
pub async fn list_user_summaries(db: &DatabaseConnection) -> Result<Vec<UserSummary>> {
    let (profiles, submissions, purchases) = tokio::join!(
        Profile::find()
            .order_by_desc(profile::Column::CreatedAt)
            .all(db),
        FormSubmission::find().all(db),
        Purchase::find()
            .filter(purchase::Column::Status.eq(STATUS_COMPLETED))
            .all(db),
    );
    let (profiles, submissions, purchases) = (profiles?, submissions?, purchases?);

    let submission_owner: HashMap<&str, &str> = submissions
        .iter()
        .map(|s| (s.id.as_str(), s.user_id.as_str()))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut completed: HashMap<&str, bool> = HashMap::new();
    for s in &submissions {
        *counts.entry(s.user_id.as_str()).or_default() += 1;
        if s.is_primary && s.state == SubmissionState::Completed {
            completed.insert(s.user_id.as_str(), true);
        }
    }

    let mut paid: HashMap<String, f64> = HashMap::new();
    for payment in purchases.into_iter().filter_map(validate_purchase) {
        let owner = payment.user_id.clone().or_else(|| {
            payment
                .form_submission_id
                .as_deref()
                .and_then(|id| submission_owner.get(id))
                .map(|u| (*u).to_string())
        });
        if let Some(user_id) = owner {
            *paid.entry(user_id).or_default() += payment.amount;
        }
    }

    Ok(profiles
        .into_iter()
        .map(|p| UserSummary {
            submission_count: counts.get(p.id.as_str()).copied().unwrap_or(0),
            has_completed_setup: completed.get(p.id.as_str()).copied().unwrap_or(false),
            total_paid: paid.get(&p.id).copied().unwrap_or(0.0),
            id: p.id,
            email: p.email,
            full_name: p.full_name,
            created_at: p.created_at,
        })
        .collect())
}

/// Removes a user and everything they own in one transaction.
///
/// Purchases linked only through one of the user's submissions go too.
/// Activity writes still in flight are awaited first so none of them lands
/// after the user is gone.
#[instrument(skip(ctx))]
pub async fn delete_user_account(ctx: &CrudContext, user_id: &str) -> Result<()> {
    ctx.activity.flush().await;
    let txn = ctx.db.begin().await?;

    if Profile::find_by_id(user_id.to_string())
        .one(&txn)
        .await?
        .is_none()
    {
        return Err(Error::NotFound {
            entity: "user",
            id: user_id.to_string(),
        });
    }

    let submission_ids: Vec<String> = FormSubmission::find()
        .filter(form_submission::Column::UserId.eq(user_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    let activities = UserActivity::delete_many()
        .filter(user_activity::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    let purchases = Purchase::delete_many()
        .filter(
            Condition::any()
                .add(purchase::Column::UserId.eq(user_id))
                .add(purchase::Column::FormSubmissionId.is_in(submission_ids)),
        )
        .exec(&txn)
        .await?;
    Assignment::delete_many()
        .filter(assignment::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    Owner::delete_many()
        .filter(owner::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    Property::delete_many()
        .filter(property::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    FormSubmission::delete_many()
        .filter(form_submission::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    Profile::delete_by_id(user_id.to_string()).exec(&txn).await?;

    txn.commit().await?;
    info!(
        user_id,
        activities = activities.rows_affected,
        purchases = purchases.rows_affected,
        "User account deleted"
    );
    ctx.notifier
        .success("User deleted", format!("Account {user_id} was removed."));
    Ok(())
}

/// Marks a pending purchase as completed.
///
/// Purchases in any other state are returned unchanged.
#[instrument(skip(ctx))]
pub async fn verify_payment(ctx: &CrudContext, purchase_id: &str) -> Result<purchase::Model> {
    const TITLE: &str = "Could not verify payment";
    let current = Purchase::find_by_id(purchase_id.to_string())
        .one(&ctx.db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "purchase",
            id: purchase_id.to_string(),
        })?;

    if current.status != STATUS_PENDING {
        debug!("Purchase {} already {}", purchase_id, current.status);
        return Ok(current);
    }

    let mut active: purchase::ActiveModel = current.into();
    active.status = Set(STATUS_COMPLETED.to_string());
    let updated = active
        .update(&ctx.db)
        .await
        .map_err(|e| ctx.backend_failure(TITLE, "verify payment", &e))?;
    info!("Purchase {} verified", purchase_id);

    if let Some(user_id) = updated.user_id.as_deref() {
        drop(
            ctx.activity.spawn(
                ActivityEntry::new(user_id, "payment_verified", "Payment was verified")
                    .with_metadata(json!({ "purchase_id": updated.id, "amount": updated.amount })),
            ),
        );
    }
    ctx.notifier
        .success("Payment verified", format!("Purchase {purchase_id} is completed."));
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{
            notify::NoticeLevel,
            owner,
            types::OwnerInput,
        },
        test_utils::{
            insert_test_profile, insert_test_purchase, insert_test_purchase_at,
            insert_test_submission, setup_test_context, setup_test_db,
        },
    };

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse");
        assert!(hash.contains('$'));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert_ne!(hash, hash_password("correct horse"));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("anything", "no-separator"));
        assert!(!verify_password("anything", "salt$short"));
    }

    #[tokio::test]
    async fn test_login_and_verify_session() -> Result<()> {
        let db = setup_test_db().await?;
        ensure_admin(&db, "Admin@Example.com", "s3cret").await?;

        let session = login(&db, "admin@example.com", "s3cret", Duration::hours(8)).await?;
        assert!(session.admin.last_login_at.is_some());

        let admin = verify_session(&db, &session.token, Utc::now()).await?;
        assert_eq!(admin.email, "admin@example.com");

        assert!(logout(&db, &session.token).await?);
        let after = verify_session(&db, &session.token, Utc::now()).await;
        assert!(matches!(after, Err(Error::Unauthorized { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() -> Result<()> {
        let db = setup_test_db().await?;
        ensure_admin(&db, "admin@example.com", "s3cret").await?;

        let result = login(&db, "admin@example.com", "guess", Duration::hours(8)).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        let result = login(&db, "nobody@example.com", "s3cret", Duration::hours(8)).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() -> Result<()> {
        let db = setup_test_db().await?;
        ensure_admin(&db, "admin@example.com", "s3cret").await?;
        let session = login(&db, "admin@example.com", "s3cret", Duration::minutes(5)).await?;

        let later = Utc::now() + Duration::minutes(10);
        let result = verify_session(&db, &session.token, later).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        assert!(
            AdminSession::find_by_id(session.token)
                .one(&db)
                .await?
                .is_none()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_admin_resets_password() -> Result<()> {
        let db = setup_test_db().await?;
        let first = ensure_admin(&db, "admin@example.com", "old").await?;
        let second = ensure_admin(&db, "admin@example.com", "new").await?;
        assert_eq!(first.id, second.id);

        assert!(login(&db, "admin@example.com", "new", Duration::hours(1)).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_user_summaries_attribute_payments_via_submissions() -> Result<()> {
        let db = setup_test_db().await?;
        insert_test_profile(&db, "user-1", "giulia@example.com").await?;
        insert_test_profile(&db, "user-2", "marco@example.com").await?;
        insert_test_submission(&db, "s1", "user-1", SubmissionState::Completed, true).await?;
        insert_test_purchase(&db, "p1", None, Some("s1"), Some(149.0)).await?;
        insert_test_purchase(&db, "p2", Some("user-1"), None, Some(20.0)).await?;
        insert_test_purchase_at(&db, "p3", Some(500.0), STATUS_PENDING, Utc::now()).await?;

        let summaries = list_user_summaries(&db).await?;
        let giulia = summaries.iter().find(|s| s.id == "user-1").unwrap();
        assert_eq!(giulia.submission_count, 1);
        assert!(giulia.has_completed_setup);
        assert_eq!(giulia.total_paid, 169.0);

        let marco = summaries.iter().find(|s| s.id == "user-2").unwrap();
        assert_eq!(marco.total_paid, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_user_account_removes_everything() -> Result<()> {
        let ctx = setup_test_context().await?;
        insert_test_profile(&ctx.db, "user-1", "giulia@example.com").await?;
        insert_test_profile(&ctx.db, "user-2", "marco@example.com").await?;
        insert_test_submission(&ctx.db, "s1", "user-1", SubmissionState::New, true).await?;
        insert_test_purchase(&ctx.db, "p1", None, Some("s1"), Some(149.0)).await?;
        insert_test_purchase(&ctx.db, "p2", Some("user-2"), None, Some(20.0)).await?;
        owner::create_owner(
            &ctx,
            OwnerInput {
                first_name: "Giulia".to_string(),
                last_name: "Rossi".to_string(),
                ..Default::default()
            },
            "user-1",
        )
        .await?;

        delete_user_account(&ctx, "user-1").await?;

        assert!(Profile::find_by_id("user-1".to_string()).one(&ctx.db).await?.is_none());
        assert!(owner::list_owners_for_user(&ctx.db, "user-1").await?.is_empty());
        assert!(Purchase::find_by_id("p1".to_string()).one(&ctx.db).await?.is_none());
        assert!(Purchase::find_by_id("p2".to_string()).one(&ctx.db).await?.is_some());
        assert!(Profile::find_by_id("user-2".to_string()).one(&ctx.db).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_user_account_leaves_no_late_activity() -> Result<()> {
        let ctx = setup_test_context().await?;
        insert_test_profile(&ctx.db, "user-1", "giulia@example.com").await?;
        owner::create_owner(
            &ctx,
            OwnerInput {
                first_name: "Giulia".to_string(),
                last_name: "Rossi".to_string(),
                ..Default::default()
            },
            "user-1",
        )
        .await?;

        // The owner_created write is still detached at this point.
        delete_user_account(&ctx, "user-1").await?;
        ctx.activity.flush().await;

        let left = UserActivity::find()
            .filter(user_activity::Column::UserId.eq("user-1"))
            .count(&ctx.db)
            .await?;
        assert_eq!(left, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_not_found() -> Result<()> {
        let ctx = setup_test_context().await?;
        let result = delete_user_account(&ctx, "ghost").await;
        assert!(matches!(result, Err(Error::NotFound { entity: "user", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_verify_payment_only_moves_pending() -> Result<()> {
        let ctx = setup_test_context().await?;
        insert_test_purchase_at(&ctx.db, "pending", Some(99.0), STATUS_PENDING, Utc::now())
            .await?;
        insert_test_purchase_at(&ctx.db, "refunded", Some(99.0), "refunded", Utc::now()).await?;
        let mut notices = ctx.notifier.subscribe();

        let verified = verify_payment(&ctx, "pending").await?;
        assert_eq!(verified.status, STATUS_COMPLETED);
        let notice = notices.try_recv().ok();
        assert_eq!(
            notice.map(|n| (n.level, n.title)),
            Some((NoticeLevel::Success, "Payment verified".to_string()))
        );

        let untouched = verify_payment(&ctx, "refunded").await?;
        assert_eq!(untouched.status, "refunded");

        let missing = verify_payment(&ctx, "missing").await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        Ok(())
    }
}
