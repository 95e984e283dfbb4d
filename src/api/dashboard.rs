//! Health, analytics and activity-log inspection routes.

use crate::{
    api::{AppState, error::ApiError},
    core::{
        activity::FailedActivity,
        analytics::{DashboardAnalytics, fetch_dashboard_analytics},
        charts::{DashboardCharts, build_charts},
    },
};
use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};

/// Analytics figures with their illustrative charts
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub analytics: DashboardAnalytics,
    pub charts: DashboardCharts,
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /admin/analytics`
pub async fn analytics(
    State(state): State<AppState>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let analytics = fetch_dashboard_analytics(&state.ctx.db, Utc::now()).await?;
    let charts = build_charts(&analytics);
    Ok(Json(AnalyticsResponse { analytics, charts }))
}

/// `GET /admin/activity/failures`
pub async fn activity_failures(State(state): State<AppState>) -> Json<Vec<FailedActivity>> {
    Json(state.ctx.activity.recent_failures().await)
}

/// `DELETE /admin/activity/failures`
pub async fn clear_activity_failures(State(state): State<AppState>) -> Json<Value> {
    let cleared = state.ctx.activity.clear_failures().await;
    Json(json!({ "cleared": cleared }))
}
