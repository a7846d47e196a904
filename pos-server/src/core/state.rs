use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use shared::util::DAY_MS;
use sqlx::SqlitePool;

use crate::branches::{BranchSwitcher, NoopSyncHook};
use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::db::DbService;
use crate::db::repository::communication_log::DbCommunicationLog;
use crate::db::repository::{audit_log, communication_log, customer};
use crate::dispatch::{DispatchService, MessageTransport, SmsGateway, WhatsAppGateway};
use crate::utils::logger;

/// Retention for communication/audit rows and rotated log files
const LOG_RETENTION_DAYS: i64 = 90;

/// Shared handles for everything the API and background tasks need.
/// Cloning is shallow; all services sit behind `Arc`.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub dispatch: Arc<DispatchService>,
    pub switcher: Arc<BranchSwitcher>,
}

impl ServerState {
    /// Initialize in dependency order: database, transports, dispatch
    /// service, branch switcher (with its persisted pointer restored).
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;

        let db = DbService::new(&config.database_path).await?;

        let sms: Option<Arc<dyn MessageTransport>> = match &config.sms_gateway_url {
            Some(url) => Some(Arc::new(SmsGateway::new(
                url.clone(),
                config.sms_api_key.clone(),
                config.sms_sender_id.clone(),
            )?)),
            None => {
                tracing::info!("SMS_GATEWAY_URL not set, SMS channel disabled");
                None
            }
        };
        let whatsapp: Option<Arc<dyn MessageTransport>> = match &config.whatsapp_bridge_url {
            Some(url) => Some(Arc::new(WhatsAppGateway::new(
                url.clone(),
                config.whatsapp_session_id.clone(),
            )?)),
            None => {
                tracing::info!("WHATSAPP_BRIDGE_URL not set, WhatsApp channel disabled");
                None
            }
        };

        let dispatch = DispatchService::new(
            db.pool.clone(),
            sms,
            whatsapp,
            Arc::new(DbCommunicationLog::new(db.pool.clone())),
            config.default_dispatch_config(),
        );

        let switcher = Arc::new(BranchSwitcher::new(db.pool.clone(), Arc::new(NoopSyncHook)));
        switcher.restore().await;

        Ok(Self {
            config: config.clone(),
            db,
            dispatch,
            switcher,
        })
    }

    /// Register periodic maintenance. Must run before `Server::run()`.
    ///
    /// - `activity_decay`: flips `is_active` off for customers whose last
    ///   visit slid outside the 90-day window
    /// - `log_cleanup`: prunes rotated log files and aged log rows
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let pool = self.db.pool.clone();
        let token = tasks.shutdown_token();
        tasks.spawn("activity_decay", TaskKind::Periodic, async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60 * 60));
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        match customer::decay_stale_active(&pool, shared::util::now_millis()).await {
                            Ok(0) => {}
                            Ok(n) => tracing::info!(count = n, "Marked customers inactive"),
                            Err(e) => tracing::warn!(error = %e, "Activity decay sweep failed"),
                        }
                    }
                }
            }
        });

        let pool = self.db.pool.clone();
        let log_dir = self.config.log_dir();
        let token = tasks.shutdown_token();
        tasks.spawn("log_cleanup", TaskKind::Periodic, async move {
            let mut interval = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = logger::cleanup_old_logs(Path::new(&log_dir)) {
                            tracing::warn!(error = %e, "Log file cleanup failed");
                        }
                        let cutoff = shared::util::now_millis() - LOG_RETENTION_DAYS * DAY_MS;
                        if let Err(e) = purge_aged_rows(&pool, cutoff).await {
                            tracing::warn!(error = %e, "Log row cleanup failed");
                        }
                    }
                }
            }
        });
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}

async fn purge_aged_rows(pool: &SqlitePool, cutoff: i64) -> crate::utils::AppResult<()> {
    let comms = communication_log::purge_before(pool, cutoff).await?;
    let audits = audit_log::purge_before(pool, cutoff).await?;
    if comms + audits > 0 {
        tracing::info!(
            communication = comms,
            audit = audits,
            "Purged aged log rows"
        );
    }
    Ok(())
}
