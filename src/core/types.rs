//! UI-facing entity shapes.
//!
//! These are what the dashboard reads and writes. Storage rows live in
//! [`crate::entities`]; `core::transform` converts between the two.

use crate::entities::{PropertyActivity, PropertyType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Postal address of an owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// Where an owner lives in Italy, when resident
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItalianResidence {
    pub comune: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
}

/// An owner as shown in the intake form and dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub country_of_birth: Option<String>,
    pub citizenship: Option<String>,
    pub address: Address,
    pub italian_tax_code: Option<String>,
    pub is_resident_in_italy: bool,
    pub italian_residence: Option<ItalianResidence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owner {
    /// "First Last", trimmed
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Fields accepted when creating an owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnerInput {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub country_of_birth: Option<String>,
    pub citizenship: Option<String>,
    pub address: Address,
    pub italian_tax_code: Option<String>,
    pub is_resident_in_italy: bool,
    pub italian_residence: Option<ItalianResidence>,
}

/// Partial owner update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub country_of_birth: Option<String>,
    pub citizenship: Option<String>,
    pub address: Option<Address>,
    pub italian_tax_code: Option<String>,
    pub is_resident_in_italy: Option<bool>,
    pub italian_residence: Option<ItalianResidence>,
}

/// Postal address of a property in Italy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAddress {
    pub street: Option<String>,
    pub comune: Option<String>,
    pub province: Option<String>,
    pub zip: Option<String>,
}

/// How a property was used during the tax year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyStatus {
    PersonalUse,
    LongTermRent,
    ShortTermRent,
    Unoccupied,
}

/// Number of months a property spent in one occupancy status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyAllocation {
    pub status: OccupancyStatus,
    pub months: u8,
}

/// A document uploaded for a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDocument {
    pub name: String,
    /// Storage path of the uploaded file
    pub path: String,
}

/// Purchase and sale details for the tax year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTransfer {
    pub activity: PropertyActivity,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub sale_date: Option<NaiveDate>,
    pub sale_price: Option<f64>,
}

impl Default for PropertyTransfer {
    fn default() -> Self {
        Self {
            activity: PropertyActivity::OwnedAllYear,
            purchase_date: None,
            purchase_price: None,
            sale_date: None,
            sale_price: None,
        }
    }
}

/// A property as shown in the intake form and dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub user_id: String,
    pub label: String,
    pub address: PropertyAddress,
    pub property_type: PropertyType,
    pub transfer: PropertyTransfer,
    pub occupancy: Vec<OccupancyAllocation>,
    pub rental_income: Option<f64>,
    pub is_remodeled: bool,
    pub documents: Vec<PropertyDocument>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyInput {
    pub label: String,
    pub address: PropertyAddress,
    pub property_type: PropertyType,
    pub transfer: PropertyTransfer,
    pub occupancy: Vec<OccupancyAllocation>,
    pub rental_income: Option<f64>,
    pub is_remodeled: bool,
    pub documents: Vec<PropertyDocument>,
    pub notes: Option<String>,
}

impl Default for PropertyInput {
    fn default() -> Self {
        Self {
            label: String::new(),
            address: PropertyAddress::default(),
            property_type: PropertyType::Residential,
            transfer: PropertyTransfer::default(),
            occupancy: Vec::new(),
            rental_income: None,
            is_remodeled: false,
            documents: Vec::new(),
            notes: None,
        }
    }
}

/// Partial property update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyPatch {
    pub label: Option<String>,
    pub address: Option<PropertyAddress>,
    pub property_type: Option<PropertyType>,
    pub transfer: Option<PropertyTransfer>,
    pub occupancy: Option<Vec<OccupancyAllocation>>,
    pub rental_income: Option<f64>,
    pub is_remodeled: Option<bool>,
    pub documents: Option<Vec<PropertyDocument>>,
    pub notes: Option<String>,
}

/// Residency of an owner at an assigned property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Residency {
    pub resident_at_property: bool,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Link between one owner and one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerPropertyAssignment {
    pub id: String,
    pub user_id: String,
    pub owner_id: String,
    pub property_id: String,
    pub ownership_percentage: f64,
    pub residency: Residency,
    pub tax_credits: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating an assignment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignmentInput {
    pub owner_id: String,
    pub property_id: String,
    pub ownership_percentage: f64,
    pub residency: Residency,
    pub tax_credits: Option<f64>,
}

/// Partial assignment update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignmentPatch {
    pub ownership_percentage: Option<f64>,
    pub residency: Option<Residency>,
    pub tax_credits: Option<f64>,
}
