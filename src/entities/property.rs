//! Property entity - a piece of Italian real estate declared in the intake form.
//!
//! Occupancy allocations and attached documents are lists; they are stored as
//! JSON text and decoded by `core::transform`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of property
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[sea_orm(string_value = "residential")]
    Residential,
    #[sea_orm(string_value = "b_and_b")]
    BAndB,
    #[sea_orm(string_value = "vacant_land")]
    VacantLand,
    #[sea_orm(string_value = "land")]
    Land,
    #[sea_orm(string_value = "other")]
    Other,
}

/// What happened to the property during the tax year
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PropertyActivity {
    #[sea_orm(string_value = "owned_all_year")]
    OwnedAllYear,
    #[sea_orm(string_value = "purchased")]
    Purchased,
    #[sea_orm(string_value = "sold")]
    Sold,
    #[sea_orm(string_value = "purchased_and_sold")]
    PurchasedAndSold,
}

/// Property database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    /// UUID v4 assigned on create
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Account that owns this record
    pub user_id: String,
    /// Short name shown in lists, e.g. "Casa Roma"
    pub label: String,
    pub address_street: Option<String>,
    pub address_comune: Option<String>,
    pub address_province: Option<String>,
    pub address_zip: Option<String>,
    pub property_type: PropertyType,
    pub activity: PropertyActivity,
    pub purchase_date: Option<Date>,
    pub purchase_price: Option<f64>,
    pub sale_date: Option<Date>,
    pub sale_price: Option<f64>,
    /// JSON array of `{ status, months }`
    #[sea_orm(column_type = "Text")]
    pub occupancy_allocations: String,
    pub rental_income: Option<f64>,
    pub is_remodeled: bool,
    /// JSON array of `{ name, path }`
    #[sea_orm(column_type = "Text")]
    pub documents: String,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Property and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One property has many owner assignments
    #[sea_orm(has_many = "super::assignment::Entity")]
    Assignments,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
