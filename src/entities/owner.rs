//! Owner entity - a natural person who owns (part of) a property in Italy.
//!
//! Each owner belongs to one user account. Address and Italian residence
//! details are stored flat; the UI-facing shape nests them (see `core::types`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Owner database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "owners")]
pub struct Model {
    /// UUID v4 assigned on create
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Account that owns this record
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<Date>,
    pub country_of_birth: Option<String>,
    pub citizenship: Option<String>,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
    pub address_zip: Option<String>,
    pub address_state: Option<String>,
    pub address_country: Option<String>,
    /// Italian tax code (codice fiscale), if the owner already has one
    pub italian_tax_code: Option<String>,
    pub is_resident_in_italy: bool,
    pub italian_residence_comune: Option<String>,
    pub italian_residence_street: Option<String>,
    pub italian_residence_city: Option<String>,
    pub italian_residence_zip: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Owner and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One owner has many property assignments
    #[sea_orm(has_many = "super::assignment::Entity")]
    Assignments,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
