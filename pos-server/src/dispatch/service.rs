//! Dispatch Service
//!
//! Orchestrates dispatch jobs: persistence, lifecycle transitions, and
//! the background send loop. One job runs per tokio task; the service
//! keeps a registry of live progress receivers so handlers can answer
//! progress queries without touching the database.

use super::throttler::{BulkDispatcher, TokioPacer};
use super::{CommunicationLog, MessageTransport, Pacer};
use crate::db::repository::bulk_message;
use crate::utils::{AppError, AppResult};
use dashmap::DashMap;
use shared::models::{
    BulkMessageCreate, DispatchConfig, DispatchProgress, ExecutionMode, JobStatus, MessageChannel,
    ScheduledBulkMessage,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::watch;

pub struct DispatchService {
    pool: SqlitePool,
    sms: Option<Arc<dyn MessageTransport>>,
    whatsapp: Option<Arc<dyn MessageTransport>>,
    comm_log: Arc<dyn CommunicationLog>,
    pacer: Arc<dyn Pacer>,
    default_config: DispatchConfig,
    running: DashMap<i64, watch::Receiver<DispatchProgress>>,
}

impl DispatchService {
    pub fn new(
        pool: SqlitePool,
        sms: Option<Arc<dyn MessageTransport>>,
        whatsapp: Option<Arc<dyn MessageTransport>>,
        comm_log: Arc<dyn CommunicationLog>,
        default_config: DispatchConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            pool,
            sms,
            whatsapp,
            comm_log,
            pacer: Arc::new(TokioPacer),
            default_config,
            running: DashMap::new(),
        })
    }

    /// Same transport on both channels and a caller-supplied pacer.
    /// Used by tests and dry runs.
    pub fn with_pacer(
        pool: SqlitePool,
        transport: Arc<dyn MessageTransport>,
        comm_log: Arc<dyn CommunicationLog>,
        pacer: Arc<dyn Pacer>,
    ) -> Arc<Self> {
        Arc::new(Self {
            pool,
            sms: Some(transport.clone()),
            whatsapp: Some(transport),
            comm_log,
            pacer,
            default_config: DispatchConfig::default(),
            running: DashMap::new(),
        })
    }

    /// Create a job in `pending` state. The payload is validated here so
    /// a job that can never run is rejected up front.
    pub async fn create_job(&self, data: BulkMessageCreate) -> AppResult<ScheduledBulkMessage> {
        let config = data.config.clone().unwrap_or_else(|| self.default_config.clone());
        BulkDispatcher::validate(&data.template, &data.recipients, &config)
            .map_err(|e| AppError::validation(e.to_string()))?;
        bulk_message::create(&self.pool, &data, &config).await
    }

    pub async fn get(&self, id: i64) -> AppResult<ScheduledBulkMessage> {
        bulk_message::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Dispatch job {id} not found")))
    }

    pub async fn list(&self) -> AppResult<Vec<ScheduledBulkMessage>> {
        bulk_message::find_all(&self.pool).await
    }

    /// Live progress for a running job, falling back to the persisted
    /// counters for finished ones.
    pub async fn progress(&self, id: i64) -> AppResult<DispatchProgress> {
        if let Some(rx) = self.running.get(&id) {
            return Ok(*rx.borrow());
        }
        Ok(self.get(id).await?.progress)
    }

    /// Start the send loop for a job. Validation and the status guard
    /// both run before any message leaves the building.
    pub async fn start(self: &Arc<Self>, id: i64) -> AppResult<()> {
        let job = self.get(id).await?;

        if job.execution_mode == ExecutionMode::Browser {
            return Err(AppError::business_rule(
                "Browser-executed jobs are dispatched by the client, not the server",
            ));
        }
        if self.running.contains_key(&id) {
            return Err(AppError::conflict(format!("Dispatch job {id} is already running")));
        }
        let transport = self.transport_for(job.channel)?;

        BulkDispatcher::validate(&job.template, &job.recipients, &job.config)
            .map_err(|e| AppError::validation(e.to_string()))?;

        if !bulk_message::mark_running(&self.pool, id).await? {
            return Err(AppError::conflict(format!(
                "Dispatch job {id} cannot start from its current status"
            )));
        }

        let (tx, rx) = watch::channel(job.progress);
        self.running.insert(id, rx.clone());
        self.spawn_progress_persister(id, rx);

        let service = Arc::clone(self);
        tokio::spawn(async move {
            let dispatcher =
                BulkDispatcher::new(transport, service.comm_log.clone(), service.pacer.clone());
            let result = dispatcher
                .run(&job.template, &job.recipients, &job.config, &tx)
                .await;
            service.running.remove(&id);

            match result {
                Ok(tally) => {
                    tracing::info!(
                        "Dispatch job {} completed: {}/{} sent, {} failed",
                        id,
                        tally.success,
                        tally.total,
                        tally.failed
                    );
                    if let Err(e) = bulk_message::mark_completed(&service.pool, id, tally).await {
                        tracing::error!("Failed to mark job {} completed: {}", id, e);
                    }
                }
                Err(e) => {
                    tracing::error!("Dispatch job {} failed: {}", id, e);
                    if let Err(e) = bulk_message::mark_failed(&service.pool, id).await {
                        tracing::error!("Failed to mark job {} failed: {}", id, e);
                    }
                }
            }
        });

        Ok(())
    }

    pub async fn pause(&self, id: i64) -> AppResult<ScheduledBulkMessage> {
        self.set_idle(id, JobStatus::Paused).await
    }

    pub async fn cancel(&self, id: i64) -> AppResult<ScheduledBulkMessage> {
        self.set_idle(id, JobStatus::Cancelled).await
    }

    async fn set_idle(&self, id: i64, status: JobStatus) -> AppResult<ScheduledBulkMessage> {
        // Ensure a NotFound rather than a Conflict for unknown ids
        self.get(id).await?;
        if !bulk_message::set_idle_status(&self.pool, id, status).await? {
            return Err(AppError::conflict(format!(
                "Dispatch job {id} cannot transition while running or finished"
            )));
        }
        self.get(id).await
    }

    fn transport_for(&self, channel: MessageChannel) -> AppResult<Arc<dyn MessageTransport>> {
        let transport = match channel {
            MessageChannel::Sms => self.sms.as_ref(),
            MessageChannel::Whatsapp => self.whatsapp.as_ref(),
        };
        transport.cloned().ok_or_else(|| {
            AppError::business_rule(format!("No gateway configured for channel {channel:?}"))
        })
    }

    /// Mirror watch updates into the job row so progress survives a
    /// restart mid-campaign.
    fn spawn_progress_persister(&self, id: i64, mut rx: watch::Receiver<DispatchProgress>) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let progress = *rx.borrow_and_update();
                if let Err(e) = bulk_message::update_progress(&pool, id, progress).await {
                    tracing::warn!("Failed to persist progress for job {}: {}", id, e);
                }
            }
        });
    }
}
