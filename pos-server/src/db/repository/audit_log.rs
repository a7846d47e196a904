//! Audit Log Repository
//!
//! Append-only trail for operator-visible actions. Writes are best
//! effort at the call sites; a lost audit row never fails the operation
//! it describes.

use crate::utils::AppResult;
use serde_json::json;
use sqlx::SqlitePool;

pub async fn append(
    pool: &SqlitePool,
    action: &str,
    resource_type: &str,
    resource_id: &str,
    operator_id: Option<&str>,
    details: serde_json::Value,
) -> AppResult<()> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO audit_log (id, action, resource_type, resource_id, operator_id, details, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(id)
    .bind(action)
    .bind(resource_type)
    .bind(resource_id)
    .bind(operator_id)
    .bind(details.to_string())
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn log_branch_switch(pool: &SqlitePool, branch_id: i64, user_id: &str) -> AppResult<()> {
    append(
        pool,
        "branch_switch",
        "branch",
        &branch_id.to_string(),
        Some(user_id),
        json!({ "branch_id": branch_id }),
    )
    .await
}

/// Delete audit rows older than the retention window. Runs from the
/// periodic cleanup task.
pub async fn purge_before(pool: &SqlitePool, cutoff_millis: i64) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM audit_log WHERE created_at < ?")
        .bind(cutoff_millis)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
