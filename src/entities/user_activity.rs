//! User activity entity - append-only audit trail.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User activity database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_activities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    /// e.g. `owner_created`, `property_deleted`
    pub activity_type: String,
    pub description: String,
    /// JSON object with activity-specific details
    #[sea_orm(column_type = "Text")]
    pub metadata: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
