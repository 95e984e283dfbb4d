//! Data transformers between storage rows and UI-facing entities.
//!
//! Pure mapping functions: no I/O, no validation. List-valued property fields
//! are stored as JSON text; a malformed stored value decodes to an empty list
//! with a warning rather than failing the whole read.

use crate::{
    core::types::{
        Address, AssignmentInput, AssignmentPatch, ItalianResidence, Owner, OwnerInput,
        OwnerPatch, OwnerPropertyAssignment, Property, PropertyAddress, PropertyInput,
        PropertyPatch, Residency,
    },
    entities::{assignment, owner, property},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Converts an owner row into the UI shape.
#[must_use]
pub fn owner_from_row(row: owner::Model) -> Owner {
    let italian_residence = if row.is_resident_in_italy
        || row.italian_residence_comune.is_some()
        || row.italian_residence_street.is_some()
    {
        Some(ItalianResidence {
            comune: row.italian_residence_comune,
            street: row.italian_residence_street,
            city: row.italian_residence_city,
            zip: row.italian_residence_zip,
        })
    } else {
        None
    };

    Owner {
        id: row.id,
        user_id: row.user_id,
        first_name: row.first_name,
        last_name: row.last_name,
        date_of_birth: row.date_of_birth,
        country_of_birth: row.country_of_birth,
        citizenship: row.citizenship,
        address: Address {
            street: row.address_street,
            city: row.address_city,
            zip: row.address_zip,
            state: row.address_state,
            country: row.address_country,
        },
        italian_tax_code: row.italian_tax_code,
        is_resident_in_italy: row.is_resident_in_italy,
        italian_residence,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Converts an owner into a fully-set row for insert or update.
#[must_use]
pub fn owner_to_row(owner: &Owner) -> owner::ActiveModel {
    let residence = owner.italian_residence.clone().unwrap_or_default();
    owner::ActiveModel {
        id: Set(owner.id.clone()),
        user_id: Set(owner.user_id.clone()),
        first_name: Set(owner.first_name.clone()),
        last_name: Set(owner.last_name.clone()),
        date_of_birth: Set(owner.date_of_birth),
        country_of_birth: Set(owner.country_of_birth.clone()),
        citizenship: Set(owner.citizenship.clone()),
        address_street: Set(owner.address.street.clone()),
        address_city: Set(owner.address.city.clone()),
        address_zip: Set(owner.address.zip.clone()),
        address_state: Set(owner.address.state.clone()),
        address_country: Set(owner.address.country.clone()),
        italian_tax_code: Set(owner.italian_tax_code.clone()),
        is_resident_in_italy: Set(owner.is_resident_in_italy),
        italian_residence_comune: Set(residence.comune),
        italian_residence_street: Set(residence.street),
        italian_residence_city: Set(residence.city),
        italian_residence_zip: Set(residence.zip),
        created_at: Set(owner.created_at),
        updated_at: Set(owner.updated_at),
    }
}

/// Builds a new owner from form input.
#[must_use]
pub fn owner_from_input(id: String, user_id: &str, input: OwnerInput, now: DateTime<Utc>) -> Owner {
    Owner {
        id,
        user_id: user_id.to_string(),
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        date_of_birth: input.date_of_birth,
        country_of_birth: input.country_of_birth,
        citizenship: input.citizenship,
        address: input.address,
        italian_tax_code: input.italian_tax_code.map(|c| c.trim().to_uppercase()),
        is_resident_in_italy: input.is_resident_in_italy,
        italian_residence: input.italian_residence,
        created_at: now,
        updated_at: now,
    }
}

/// Merges a patch over the current owner.
#[must_use]
pub fn apply_owner_patch(current: &Owner, patch: OwnerPatch, now: DateTime<Utc>) -> Owner {
    let mut owner = current.clone();
    if let Some(v) = patch.first_name {
        owner.first_name = v.trim().to_string();
    }
    if let Some(v) = patch.last_name {
        owner.last_name = v.trim().to_string();
    }
    if patch.date_of_birth.is_some() {
        owner.date_of_birth = patch.date_of_birth;
    }
    if patch.country_of_birth.is_some() {
        owner.country_of_birth = patch.country_of_birth;
    }
    if patch.citizenship.is_some() {
        owner.citizenship = patch.citizenship;
    }
    if let Some(v) = patch.address {
        owner.address = v;
    }
    if let Some(v) = patch.italian_tax_code {
        owner.italian_tax_code = Some(v.trim().to_uppercase());
    }
    if let Some(v) = patch.is_resident_in_italy {
        owner.is_resident_in_italy = v;
        if !v {
            owner.italian_residence = None;
        }
    }
    if patch.italian_residence.is_some() {
        owner.italian_residence = patch.italian_residence;
    }
    owner.updated_at = now;
    owner
}

fn decode_list<T: DeserializeOwned>(raw: &str, column: &str, id: &str) -> Vec<T> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Malformed {} JSON on property {}: {}", column, id, e);
        Vec::new()
    })
}

/// Converts a property row into the UI shape.
#[must_use]
pub fn property_from_row(row: property::Model) -> Property {
    let occupancy = decode_list(&row.occupancy_allocations, "occupancy_allocations", &row.id);
    let documents = decode_list(&row.documents, "documents", &row.id);

    Property {
        id: row.id,
        user_id: row.user_id,
        label: row.label,
        address: PropertyAddress {
            street: row.address_street,
            comune: row.address_comune,
            province: row.address_province,
            zip: row.address_zip,
        },
        property_type: row.property_type,
        transfer: crate::core::types::PropertyTransfer {
            activity: row.activity,
            purchase_date: row.purchase_date,
            purchase_price: row.purchase_price,
            sale_date: row.sale_date,
            sale_price: row.sale_price,
        },
        occupancy,
        rental_income: row.rental_income,
        is_remodeled: row.is_remodeled,
        documents,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Converts a property into a fully-set row for insert or update.
pub fn property_to_row(property: &Property) -> Result<property::ActiveModel> {
    Ok(property::ActiveModel {
        id: Set(property.id.clone()),
        user_id: Set(property.user_id.clone()),
        label: Set(property.label.clone()),
        address_street: Set(property.address.street.clone()),
        address_comune: Set(property.address.comune.clone()),
        address_province: Set(property.address.province.clone()),
        address_zip: Set(property.address.zip.clone()),
        property_type: Set(property.property_type),
        activity: Set(property.transfer.activity),
        purchase_date: Set(property.transfer.purchase_date),
        purchase_price: Set(property.transfer.purchase_price),
        sale_date: Set(property.transfer.sale_date),
        sale_price: Set(property.transfer.sale_price),
        occupancy_allocations: Set(serde_json::to_string(&property.occupancy)?),
        rental_income: Set(property.rental_income),
        is_remodeled: Set(property.is_remodeled),
        documents: Set(serde_json::to_string(&property.documents)?),
        notes: Set(property.notes.clone()),
        created_at: Set(property.created_at),
        updated_at: Set(property.updated_at),
    })
}

/// Builds a new property from form input.
#[must_use]
pub fn property_from_input(
    id: String,
    user_id: &str,
    input: PropertyInput,
    now: DateTime<Utc>,
) -> Property {
    Property {
        id,
        user_id: user_id.to_string(),
        label: input.label.trim().to_string(),
        address: input.address,
        property_type: input.property_type,
        transfer: input.transfer,
        occupancy: input.occupancy,
        rental_income: input.rental_income,
        is_remodeled: input.is_remodeled,
        documents: input.documents,
        notes: input.notes,
        created_at: now,
        updated_at: now,
    }
}

/// Merges a patch over the current property.
#[must_use]
pub fn apply_property_patch(
    current: &Property,
    patch: PropertyPatch,
    now: DateTime<Utc>,
) -> Property {
    let mut property = current.clone();
    if let Some(v) = patch.label {
        property.label = v.trim().to_string();
    }
    if let Some(v) = patch.address {
        property.address = v;
    }
    if let Some(v) = patch.property_type {
        property.property_type = v;
    }
    if let Some(v) = patch.transfer {
        property.transfer = v;
    }
    if let Some(v) = patch.occupancy {
        property.occupancy = v;
    }
    if patch.rental_income.is_some() {
        property.rental_income = patch.rental_income;
    }
    if let Some(v) = patch.is_remodeled {
        property.is_remodeled = v;
    }
    if let Some(v) = patch.documents {
        property.documents = v;
    }
    if patch.notes.is_some() {
        property.notes = patch.notes;
    }
    property.updated_at = now;
    property
}

/// Converts an assignment row into the UI shape.
#[must_use]
pub fn assignment_from_row(row: assignment::Model) -> OwnerPropertyAssignment {
    OwnerPropertyAssignment {
        id: row.id,
        user_id: row.user_id,
        owner_id: row.owner_id,
        property_id: row.property_id,
        ownership_percentage: row.ownership_percentage,
        residency: Residency {
            resident_at_property: row.resident_at_property,
            from: row.resident_from,
            to: row.resident_to,
        },
        tax_credits: row.tax_credits,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Converts an assignment into a fully-set row for insert or update.
#[must_use]
pub fn assignment_to_row(assignment: &OwnerPropertyAssignment) -> assignment::ActiveModel {
    assignment::ActiveModel {
        id: Set(assignment.id.clone()),
        user_id: Set(assignment.user_id.clone()),
        owner_id: Set(assignment.owner_id.clone()),
        property_id: Set(assignment.property_id.clone()),
        ownership_percentage: Set(assignment.ownership_percentage),
        resident_at_property: Set(assignment.residency.resident_at_property),
        resident_from: Set(assignment.residency.from),
        resident_to: Set(assignment.residency.to),
        tax_credits: Set(assignment.tax_credits),
        created_at: Set(assignment.created_at),
        updated_at: Set(assignment.updated_at),
    }
}

/// Builds a new assignment from form input.
#[must_use]
pub fn assignment_from_input(
    id: String,
    user_id: &str,
    input: AssignmentInput,
    now: DateTime<Utc>,
) -> OwnerPropertyAssignment {
    OwnerPropertyAssignment {
        id,
        user_id: user_id.to_string(),
        owner_id: input.owner_id.trim().to_string(),
        property_id: input.property_id.trim().to_string(),
        ownership_percentage: input.ownership_percentage,
        residency: input.residency,
        tax_credits: input.tax_credits,
        created_at: now,
        updated_at: now,
    }
}

/// Merges a patch over the current assignment.
#[must_use]
pub fn apply_assignment_patch(
    current: &OwnerPropertyAssignment,
    patch: AssignmentPatch,
    now: DateTime<Utc>,
) -> OwnerPropertyAssignment {
    let mut assignment = current.clone();
    if let Some(v) = patch.ownership_percentage {
        assignment.ownership_percentage = v;
    }
    if let Some(v) = patch.residency {
        assignment.residency = v;
    }
    if patch.tax_credits.is_some() {
        assignment.tax_credits = patch.tax_credits;
    }
    assignment.updated_at = now;
    assignment
}
