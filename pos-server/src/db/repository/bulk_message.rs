//! Bulk Message Repository
//!
//! Recipients and dispatch config are stored as JSON text columns;
//! progress counters are flattened into integer columns so the UI can
//! query them without JSON parsing.

use crate::utils::{AppError, AppResult};
use shared::models::{
    BulkMessageCreate, DispatchConfig, DispatchProgress, ExecutionMode, JobStatus, MessageChannel,
    Recipient, ScheduledBulkMessage,
};
use sqlx::SqlitePool;

const JOB_SELECT: &str = "SELECT id, channel, template, recipients, status, progress_current, progress_total, progress_success, progress_failed, execution_mode, config, created_at, updated_at FROM scheduled_bulk_message";

#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    channel: MessageChannel,
    template: String,
    recipients: String,
    status: JobStatus,
    progress_current: i64,
    progress_total: i64,
    progress_success: i64,
    progress_failed: i64,
    execution_mode: ExecutionMode,
    config: String,
    created_at: i64,
    updated_at: i64,
}

impl JobRow {
    fn into_model(self) -> AppResult<ScheduledBulkMessage> {
        let recipients: Vec<Recipient> = serde_json::from_str(&self.recipients)
            .map_err(|e| AppError::database(format!("Corrupt recipients column: {e}")))?;
        let config: DispatchConfig = serde_json::from_str(&self.config)
            .map_err(|e| AppError::database(format!("Corrupt config column: {e}")))?;
        Ok(ScheduledBulkMessage {
            id: self.id,
            channel: self.channel,
            template: self.template,
            recipients,
            status: self.status,
            progress: DispatchProgress {
                current: self.progress_current as u32,
                total: self.progress_total as u32,
                success: self.progress_success as u32,
                failed: self.progress_failed as u32,
            },
            execution_mode: self.execution_mode,
            config,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub async fn find_all(pool: &SqlitePool) -> AppResult<Vec<ScheduledBulkMessage>> {
    let sql = format!("{} ORDER BY created_at DESC", JOB_SELECT);
    let rows = sqlx::query_as::<_, JobRow>(&sql).fetch_all(pool).await?;
    rows.into_iter().map(JobRow::into_model).collect()
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<ScheduledBulkMessage>> {
    let sql = format!("{} WHERE id = ?", JOB_SELECT);
    let row = sqlx::query_as::<_, JobRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(JobRow::into_model).transpose()
}

pub async fn create(
    pool: &SqlitePool,
    data: &BulkMessageCreate,
    config: &DispatchConfig,
) -> AppResult<ScheduledBulkMessage> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let recipients_json = serde_json::to_string(&data.recipients)
        .map_err(|e| AppError::internal(format!("Failed to encode recipients: {e}")))?;
    let config_json = serde_json::to_string(config)
        .map_err(|e| AppError::internal(format!("Failed to encode config: {e}")))?;

    sqlx::query(
        "INSERT INTO scheduled_bulk_message (id, channel, template, recipients, status, progress_total, execution_mode, config, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?7, ?8, ?8)",
    )
    .bind(id)
    .bind(data.channel)
    .bind(&data.template)
    .bind(&recipients_json)
    .bind(data.recipients.len() as i64)
    .bind(data.execution_mode.unwrap_or_default())
    .bind(&config_json)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::database("Dispatch job vanished after insert"))
}

/// Transition a job to `running`. Only pending/scheduled/paused jobs may
/// start; returns false when the guard rejects the transition.
pub async fn mark_running(pool: &SqlitePool, id: i64) -> AppResult<bool> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE scheduled_bulk_message SET status = 'running', updated_at = ?1 \
         WHERE id = ?2 AND status IN ('pending', 'scheduled', 'paused')",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Persist progress counters mid-run
pub async fn update_progress(
    pool: &SqlitePool,
    id: i64,
    progress: DispatchProgress,
) -> AppResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE scheduled_bulk_message SET progress_current = ?1, progress_success = ?2, progress_failed = ?3, updated_at = ?4 WHERE id = ?5",
    )
    .bind(progress.current as i64)
    .bind(progress.success as i64)
    .bind(progress.failed as i64)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Terminal transition after the loop finishes. Per-recipient failures do
/// not matter here; the job completed.
pub async fn mark_completed(
    pool: &SqlitePool,
    id: i64,
    progress: DispatchProgress,
) -> AppResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE scheduled_bulk_message SET status = 'completed', progress_current = ?1, progress_success = ?2, progress_failed = ?3, updated_at = ?4 WHERE id = ?5",
    )
    .bind(progress.current as i64)
    .bind(progress.success as i64)
    .bind(progress.failed as i64)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Job-level failure (the loop could not run at all)
pub async fn mark_failed(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let now = shared::util::now_millis();
    sqlx::query("UPDATE scheduled_bulk_message SET status = 'failed', updated_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Externally requested pause/cancel. Rejected while the job is running;
/// returns false when the guard blocks the transition.
pub async fn set_idle_status(pool: &SqlitePool, id: i64, status: JobStatus) -> AppResult<bool> {
    debug_assert!(matches!(status, JobStatus::Paused | JobStatus::Cancelled));
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE scheduled_bulk_message SET status = ?1, updated_at = ?2 \
         WHERE id = ?3 AND status IN ('pending', 'scheduled', 'paused')",
    )
    .bind(status)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
