//! Database configuration module.
//!
//! Handles the connection to PostgreSQL (production) or SQLite (local runs and
//! tests) through `SeaORM`, and creates every table from the entity definitions
//! with `Schema::create_table_from_entity`, so the schema always matches the
//! Rust structs without hand-written SQL.

use crate::entities::{
    AdminCredential, AdminSession, Assignment, FormSubmission, Owner, Profile, Property, Purchase,
    UserActivity,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/tax_intake.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling
/// back to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Directory of a file-backed `SQLite` URL, if it names one.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

/// Establishes a connection using [`get_database_url`].
///
/// For file-backed `SQLite` the parent directory is created first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables if they do not exist yet.
///
/// Parents are created before the tables that reference them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Profile).await?;
    create_table(db, &schema, Owner).await?;
    create_table(db, &schema, Property).await?;
    create_table(db, &schema, Assignment).await?;
    create_table(db, &schema, FormSubmission).await?;
    create_table(db, &schema, Purchase).await?;
    create_table(db, &schema, UserActivity).await?;
    create_table(db, &schema, AdminCredential).await?;
    create_table(db, &schema, AdminSession).await?;

    info!("Database tables ensured.");
    Ok(())
}
