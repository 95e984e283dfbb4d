//! Owner/property assignment - the many-to-many link between owners and properties.
//!
//! Carries the ownership share and whether the owner lived at the property.
//! Percentages across one property are not constrained to sum to 100.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Assignment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "owner_property_assignments")]
pub struct Model {
    /// UUID v4 assigned on create
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Account that owns this record
    pub user_id: String,
    pub owner_id: String,
    pub property_id: String,
    /// Share of the property held by the owner, in percent
    pub ownership_percentage: f64,
    pub resident_at_property: bool,
    pub resident_from: Option<Date>,
    pub resident_to: Option<Date>,
    pub tax_credits: Option<f64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Assignment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each assignment belongs to one owner
    #[sea_orm(
        belongs_to = "super::owner::Entity",
        from = "Column::OwnerId",
        to = "super::owner::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    /// Each assignment belongs to one property
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
}

impl Related<super::owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
