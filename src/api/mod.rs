//! Admin HTTP API.
//!
//! `/health` and `POST /admin/login` are public; every other `/admin` route
//! goes through [`auth::require_admin_session`].

use crate::{config::settings::AdminSettings, core::crud::CrudContext};
use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

/// Admin login, logout and session middleware
pub mod auth;
/// Dashboard analytics and activity inspection
pub mod dashboard;
/// Error-to-response mapping
pub mod error;
/// Owner, property and assignment CRUD routes
pub mod records;
/// Submission and purchase routes
pub mod submissions;
/// User list and account detail routes
pub mod users;

/// Shared state of every handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database plus activity logger and notifier
    pub ctx: CrudContext,
    /// Lifetime of newly issued admin sessions
    pub session_ttl: chrono::Duration,
}

impl AppState {
    /// Builds the handler state from a context and the admin settings.
    #[must_use]
    pub fn new(ctx: CrudContext, admin: &AdminSettings) -> Self {
        Self {
            ctx,
            session_ttl: chrono::Duration::hours(admin.session_ttl_hours),
        }
    }
}

/// Builds the full router with request tracing.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/logout", post(auth::logout))
        .route("/analytics", get(dashboard::analytics))
        .route("/users", get(users::list_users))
        .route(
            "/users/{user_id}",
            get(users::get_account).delete(users::delete_account),
        )
        .route(
            "/users/{user_id}/owners",
            get(records::list_owners).post(records::create_owner),
        )
        .route(
            "/users/{user_id}/owners/{id}",
            patch(records::update_owner).delete(records::delete_owner),
        )
        .route(
            "/users/{user_id}/properties",
            get(records::list_properties).post(records::create_property),
        )
        .route(
            "/users/{user_id}/properties/{id}",
            patch(records::update_property).delete(records::delete_property),
        )
        .route(
            "/users/{user_id}/assignments",
            get(records::list_assignments).post(records::create_assignment),
        )
        .route(
            "/users/{user_id}/assignments/{id}",
            patch(records::update_assignment).delete(records::delete_assignment),
        )
        .route(
            "/users/{user_id}/submissions",
            get(submissions::list_submissions).post(submissions::create_submission),
        )
        .route("/submissions/{id}/state", post(submissions::change_state))
        .route("/submissions/{id}/pdf", post(submissions::attach_pdf))
        .route("/purchases/{id}/verify", post(submissions::verify_purchase))
        .route(
            "/activity/failures",
            get(dashboard::activity_failures).delete(dashboard::clear_activity_failures),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin_session,
        ));

    Router::new()
        .route("/health", get(dashboard::health))
        .nest(
            "/admin",
            Router::new()
                .route("/login", post(auth::login))
                .merge(protected),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
