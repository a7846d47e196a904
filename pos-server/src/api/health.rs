//! Health Check

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::AppResult;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub environment: String,
    pub active_branch: Option<i64>,
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

/// GET /api/health - liveness plus a database round-trip
pub async fn health(State(state): State<ServerState>) -> AppResult<Json<HealthStatus>> {
    sqlx::query("SELECT 1").execute(state.pool()).await?;
    Ok(Json(HealthStatus {
        status: "ok",
        environment: state.config.environment.clone(),
        active_branch: state.switcher.active_branch_id(),
    }))
}
