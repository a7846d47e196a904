//! Bulk Message Models
//!
//! A scheduled bulk message is one dispatch job: a fixed recipient list,
//! one template, and pacing configuration. The throttler owns the
//! `Pending/Scheduled -> Running -> Completed/Failed` transitions;
//! `Paused`/`Cancelled` are set externally between runs.

use serde::{Deserialize, Serialize};

/// Outbound messaging channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum MessageChannel {
    Sms,
    Whatsapp,
}

/// Dispatch job lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum JobStatus {
    #[default]
    Pending,
    Scheduled,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

/// Where the send loop runs. Browser-executed jobs are tracked here but
/// dispatched by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum ExecutionMode {
    #[default]
    Server,
    Browser,
}

/// One message target: phone number plus optional display name used for
/// `{name}` personalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Live progress counters for a dispatch job.
///
/// `current` is the number of attempts made so far; counters are
/// monotonically non-decreasing while a job runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchProgress {
    pub current: u32,
    pub total: u32,
    pub success: u32,
    pub failed: u32,
}

/// Anti-ban pacing configuration for one dispatch job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Substitute `{name}`/`{phone}` placeholders per recipient
    pub personalize: bool,
    /// Draw the inter-message delay uniformly from `min..=max` instead of
    /// using `min` fixed
    pub random_delay: bool,
    pub min_delay_seconds: u64,
    pub max_delay_seconds: u64,
    /// Send a typing-presence hint and wait 1-2 s before each message
    pub simulate_typing: bool,
    /// Jobs with more recipients than this are rejected before any send
    pub daily_limit: usize,
    /// Take an extra break after every N messages (disabled when `None`)
    pub batch_size: Option<u32>,
    pub batch_delay_seconds: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            personalize: true,
            random_delay: true,
            min_delay_seconds: 3,
            max_delay_seconds: 8,
            simulate_typing: false,
            daily_limit: 100,
            batch_size: None,
            batch_delay_seconds: 60,
        }
    }
}

/// Dispatch job entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledBulkMessage {
    pub id: i64,
    pub channel: MessageChannel,
    pub template: String,
    pub recipients: Vec<Recipient>,
    pub status: JobStatus,
    pub progress: DispatchProgress,
    pub execution_mode: ExecutionMode,
    pub config: DispatchConfig,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create dispatch job payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkMessageCreate {
    pub channel: MessageChannel,
    pub template: String,
    pub recipients: Vec<Recipient>,
    pub execution_mode: Option<ExecutionMode>,
    pub config: Option<DispatchConfig>,
}
