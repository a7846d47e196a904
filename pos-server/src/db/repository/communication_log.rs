//! Communication Log Repository

use crate::dispatch::CommunicationLog;
use crate::utils::AppResult;
use async_trait::async_trait;
use shared::models::MessageChannel;
use sqlx::SqlitePool;

pub async fn insert(
    pool: &SqlitePool,
    phone: &str,
    channel: MessageChannel,
    content: &str,
) -> AppResult<()> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO communication_log (id, phone, channel, content, sent_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(id)
    .bind(phone)
    .bind(channel)
    .bind(content)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn purge_before(pool: &SqlitePool, cutoff_millis: i64) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM communication_log WHERE sent_at < ?")
        .bind(cutoff_millis)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Database-backed sink for the dispatcher. Write failures are logged
/// and dropped so a slow disk cannot break a running campaign.
pub struct DbCommunicationLog {
    pool: SqlitePool,
}

impl DbCommunicationLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommunicationLog for DbCommunicationLog {
    async fn record(&self, phone: &str, channel: MessageChannel, content: &str) {
        if let Err(e) = insert(&self.pool, phone, channel, content).await {
            tracing::warn!("Failed to record communication log for {}: {}", phone, e);
        }
    }
}
