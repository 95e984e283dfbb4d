//! Purchase entity - a payment for an intake submission.
//!
//! Rows are written by the payment provider's webhook, so links to the user and
//! the submission are optional and the amount may be missing.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: Option<String>,
    pub form_submission_id: Option<String>,
    pub amount: Option<f64>,
    pub currency: String,
    /// `pending`, `completed`, `failed` or `refunded`
    pub status: String,
    pub checkout_session_id: Option<String>,
    pub created_at: DateTimeUtc,
}

/// `Purchase` has no enforced relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
