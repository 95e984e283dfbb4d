//! Payment resolution for an account.
//!
//! Purchase rows are written by the payment provider's webhook, so their links
//! to the user and the submission are unreliable. Payments are resolved by
//! trying an ordered list of [`PaymentLookup`] strategies, each exactly once;
//! the first strategy that yields at least one valid payment wins. Every row is
//! passed through [`validate_purchase`] before it is accepted.

use crate::{
    entities::{Purchase, purchase},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// Purchase status written by the webhook once the checkout succeeded
pub const STATUS_COMPLETED: &str = "completed";
/// Purchase status before the checkout has been confirmed
pub const STATUS_PENDING: &str = "pending";

/// A purchase that passed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub user_id: Option<String>,
    pub form_submission_id: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Type guard for purchase rows.
///
/// Accepts a row only if its id is non-blank and its amount is present,
/// finite and non-negative. Rejected rows are logged and never coerced.
#[must_use]
pub fn validate_purchase(row: purchase::Model) -> Option<Payment> {
    if row.id.trim().is_empty() {
        warn!("Dropping purchase with empty id");
        return None;
    }
    let amount = match row.amount {
        Some(a) if a.is_finite() && a >= 0.0 => a,
        other => {
            warn!("Dropping purchase {} with invalid amount {:?}", row.id, other);
            return None;
        }
    };
    Some(Payment {
        id: row.id,
        user_id: row.user_id,
        form_submission_id: row.form_submission_id,
        amount,
        currency: row.currency,
        status: row.status,
        created_at: row.created_at,
    })
}

/// One way of finding a user's purchases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentLookup {
    /// Purchases linked to the submissions already fetched for the user
    BySubmissionIds,
    /// Purchases carrying the user's id
    ByUserId,
    /// Every purchase, filtered here by user id or submission id
    UnfilteredScan,
}

impl PaymentLookup {
    /// The default fallback order
    pub const DEFAULT_ORDER: [Self; 3] =
        [Self::BySubmissionIds, Self::ByUserId, Self::UnfilteredScan];

    async fn fetch<C>(
        self,
        db: &C,
        user_id: &str,
        submission_ids: &[String],
    ) -> Result<Vec<purchase::Model>>
    where
        C: ConnectionTrait,
    {
        let rows = match self {
            Self::BySubmissionIds => {
                if submission_ids.is_empty() {
                    return Ok(Vec::new());
                }
                Purchase::find()
                    .filter(
                        purchase::Column::FormSubmissionId.is_in(submission_ids.iter().cloned()),
                    )
                    .order_by_desc(purchase::Column::CreatedAt)
                    .all(db)
                    .await?
            }
            Self::ByUserId => {
                Purchase::find()
                    .filter(purchase::Column::UserId.eq(user_id))
                    .order_by_desc(purchase::Column::CreatedAt)
                    .all(db)
                    .await?
            }
            Self::UnfilteredScan => {
                let submissions: HashSet<&str> =
                    submission_ids.iter().map(String::as_str).collect();
                Purchase::find()
                    .order_by_desc(purchase::Column::CreatedAt)
                    .all(db)
                    .await?
                    .into_iter()
                    .filter(|p| {
                        p.user_id.as_deref() == Some(user_id)
                            || p
                                .form_submission_id
                                .as_deref()
                                .is_some_and(|id| submissions.contains(id))
                    })
                    .collect()
            }
        };
        Ok(rows)
    }
}

/// Outcome of a payment resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResolution {
    /// Validated payments from the winning strategy, newest first
    pub payments: Vec<Payment>,
    /// The strategy that produced them; `None` when every strategy came up empty
    pub source: Option<PaymentLookup>,
    /// Rows dropped by the type guard across all attempted strategies
    pub rejected: usize,
}

/// Tries each strategy in order and returns the first non-empty validated set.
///
/// A failing strategy is logged and the next one is tried. Only when every
/// strategy failed is [`Error::FetchExhausted`] returned; strategies that merely
/// found nothing produce an empty resolution.
#[instrument(skip(db, submission_ids, strategies))]
pub async fn resolve_payments<C>(
    db: &C,
    user_id: &str,
    submission_ids: &[String],
    strategies: &[PaymentLookup],
) -> Result<PaymentResolution>
where
    C: ConnectionTrait,
{
    let mut rejected = 0;
    let mut failures = 0;

    for &strategy in strategies {
        let rows = match strategy.fetch(db, user_id, submission_ids).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(?strategy, "Payment lookup failed: {}", e);
                failures += 1;
                continue;
            }
        };

        let fetched = rows.len();
        let payments: Vec<Payment> = rows.into_iter().filter_map(validate_purchase).collect();
        rejected += fetched - payments.len();

        if payments.is_empty() {
            debug!(?strategy, "Payment lookup found no valid payments");
            continue;
        }

        debug!(?strategy, count = payments.len(), "Payments resolved");
        return Ok(PaymentResolution {
            payments,
            source: Some(strategy),
            rejected,
        });
    }

    if !strategies.is_empty() && failures == strategies.len() {
        return Err(Error::FetchExhausted {
            what: format!("payments of user {user_id}"),
        });
    }

    Ok(PaymentResolution {
        payments: Vec::new(),
        source: None,
        rejected,
    })
}

/// Sum of the payment amounts.
#[must_use]
pub fn total_amount(payments: &[Payment]) -> f64 {
    payments.iter().map(|p| p.amount).sum()
}
