//! Bulk Message API Handlers
//!
//! Thin layer over [`DispatchService`]; the pacing and status rules
//! live there, not here.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::api::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppResponse, AppResult, ok_with_message};
use shared::models::{
    BulkMessageCreate, DispatchConfig, DispatchProgress, ExecutionMode, MessageChannel, Recipient,
    ScheduledBulkMessage,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequest {
    pub channel: MessageChannel,
    #[validate(length(min = 1, max = 4000))]
    pub template: String,
    #[validate(length(min = 1))]
    pub recipients: Vec<Recipient>,
    pub execution_mode: Option<ExecutionMode>,
    pub config: Option<DispatchConfig>,
}

/// GET /api/dispatch - all jobs, newest first
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<ScheduledBulkMessage>>> {
    let jobs = state.dispatch.list().await?;
    Ok(Json(jobs))
}

/// GET /api/dispatch/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ScheduledBulkMessage>> {
    let mut job = state.dispatch.get(id).await?;
    // Overlay live counters for a running job
    job.progress = state.dispatch.progress(id).await?;
    Ok(Json(job))
}

/// GET /api/dispatch/:id/progress - live counters only
pub async fn progress(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DispatchProgress>> {
    let progress = state.dispatch.progress(id).await?;
    Ok(Json(progress))
}

/// POST /api/dispatch - create a job in `pending` state
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateRequest>,
) -> AppResult<Json<ScheduledBulkMessage>> {
    payload.validate()?;

    let job = state
        .dispatch
        .create_job(BulkMessageCreate {
            channel: payload.channel,
            template: payload.template,
            recipients: payload.recipients,
            execution_mode: payload.execution_mode,
            config: payload.config,
        })
        .await?;
    tracing::info!(job_id = job.id, user_id = %user.id, "Dispatch job created");
    Ok(Json(job))
}

/// POST /api/dispatch/:id/start - kick off the send loop
pub async fn start(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<ScheduledBulkMessage>>> {
    state.dispatch.start(id).await?;
    tracing::info!(job_id = id, user_id = %user.id, "Dispatch job started");
    let job = state.dispatch.get(id).await?;
    Ok(ok_with_message(job, "Dispatch started"))
}

/// POST /api/dispatch/:id/pause - rejected while running
pub async fn pause(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ScheduledBulkMessage>> {
    let job = state.dispatch.pause(id).await?;
    Ok(Json(job))
}

/// POST /api/dispatch/:id/cancel - rejected while running
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ScheduledBulkMessage>> {
    let job = state.dispatch.cancel(id).await?;
    Ok(Json(job))
}
