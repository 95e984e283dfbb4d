//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod admin_credential;
pub mod admin_session;
pub mod assignment;
pub mod form_submission;
pub mod owner;
pub mod profile;
pub mod property;
pub mod purchase;
pub mod user_activity;

// Re-export specific types to avoid conflicts
pub use admin_credential::{
    Column as AdminCredentialColumn, Entity as AdminCredential, Model as AdminCredentialModel,
};
pub use admin_session::{
    Column as AdminSessionColumn, Entity as AdminSession, Model as AdminSessionModel,
};
pub use assignment::{Column as AssignmentColumn, Entity as Assignment, Model as AssignmentModel};
pub use form_submission::{
    Column as FormSubmissionColumn, Entity as FormSubmission, Model as FormSubmissionModel,
    SubmissionState,
};
pub use owner::{Column as OwnerColumn, Entity as Owner, Model as OwnerModel};
pub use profile::{Column as ProfileColumn, Entity as Profile, Model as ProfileModel};
pub use property::{
    Column as PropertyColumn, Entity as Property, Model as PropertyModel, PropertyActivity,
    PropertyType,
};
pub use purchase::{Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel};
pub use user_activity::{
    Column as UserActivityColumn, Entity as UserActivity, Model as UserActivityModel,
};
