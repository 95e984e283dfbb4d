/// UI-facing entity shapes (owners, properties, assignments)
pub mod types;

/// Conversions between UI shapes and storage rows
pub mod transform;

/// Shared validation and side-channel plumbing for mutations
pub mod crud;

/// Broadcast notifications for mutation outcomes
pub mod notify;

/// Best-effort audit trail writer
pub mod activity;

/// Owner CRUD
pub mod owner;

/// Property CRUD
pub mod property;

/// Owner-property assignment CRUD
pub mod assignment;

/// Form submissions and their processing state
pub mod submission;

/// Purchase validation and ordered payment lookup
pub mod payments;

/// Account detail aggregation for the admin screen
pub mod account;

/// Platform-wide analytics and growth rates
pub mod analytics;

/// Synthetic chart series derived from analytics
pub mod charts;

/// Admin sessions and account tooling
pub mod admin;
