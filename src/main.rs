use dotenvy::dotenv;
use tax_intake::{
    api::{self, AppState},
    config,
    core::{activity::ActivityLogger, admin, crud::CrudContext, notify::Notifier},
    errors::Result,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    if dotenv().is_err() {
        info!("No .env file loaded.");
    }

    // 3. Load application settings (missing file falls back to defaults)
    let settings = config::settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Connect and make sure every table exists
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the admin login from ADMIN_EMAIL / ADMIN_PASSWORD
    match config::admin::bootstrap_admin_from_env() {
        Some((email, password)) => {
            admin::ensure_admin(&db, &email, &password).await?;
        }
        None => warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set; no admin login seeded."),
    }

    // 6. Serve the admin API
    let activity = ActivityLogger::new(db.clone(), settings.activity.buffer_capacity);
    let ctx = CrudContext::new(db, activity, Notifier::default());
    let app = api::router(AppState::new(ctx, &settings.admin));

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", settings.server.bind_address, e))?;
    info!("Listening on {}", settings.server.bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}
