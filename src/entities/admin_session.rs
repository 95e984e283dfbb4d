//! Admin session entity - short-lived token issued on admin login.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Admin session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_sessions")]
pub struct Model {
    /// Opaque token sent in the `x-admin-session-token` header
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    pub admin_id: String,
    pub expires_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `AdminSession` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each session belongs to one admin
    #[sea_orm(
        belongs_to = "super::admin_credential::Entity",
        from = "Column::AdminId",
        to = "super::admin_credential::Column::Id",
        on_delete = "Cascade"
    )]
    Admin,
}

impl Related<super::admin_credential::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admin.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
