//! Branch Switch Flow
//!
//! One `BranchSwitcher` instance lives in `ServerState` for the whole
//! process. A switch:
//!
//! 1. validates the target against the caller's assignments,
//! 2. takes the single-flight latch (a concurrent switch fails, it is
//!    never queued),
//! 3. optimistically updates the active-branch pointer and persists it,
//! 4. kicks off a best-effort cache resync that never reverts the switch,
//! 5. writes a best-effort audit row.
//!
//! Steps 3-5 report failures through logs only; once the pointer moved,
//! the switch has happened.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::SqlitePool;

use crate::db::repository::{app_setting, audit_log, branch};
use crate::utils::{AppError, AppResult};
use shared::models::{Branch, Role};

/// Settings key persisting the active branch across restarts
pub const ACTIVE_BRANCH_KEY: &str = "active_branch_id";

/// Collaborator refreshing branch-dependent caches after a switch.
///
/// Failures are reported, never propagated; the switch stands either way.
#[async_trait]
pub trait BranchSyncHook: Send + Sync {
    async fn resync(&self, branch_id: i64) -> anyhow::Result<()>;
}

/// No-op hook for tests and minimal deployments
pub struct NoopSyncHook;

#[async_trait]
impl BranchSyncHook for NoopSyncHook {
    async fn resync(&self, _branch_id: i64) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct BranchSwitcher {
    pool: SqlitePool,
    active: RwLock<Option<i64>>,
    /// Single-flight latch; held for the whole switch flow
    in_flight: AtomicBool,
    sync_hook: Arc<dyn BranchSyncHook>,
}

impl BranchSwitcher {
    pub fn new(pool: SqlitePool, sync_hook: Arc<dyn BranchSyncHook>) -> Self {
        Self {
            pool,
            active: RwLock::new(None),
            in_flight: AtomicBool::new(false),
            sync_hook,
        }
    }

    /// Load the persisted active branch at startup
    pub async fn restore(&self) {
        match app_setting::get(&self.pool, ACTIVE_BRANCH_KEY).await {
            Ok(Some(value)) => match value.parse::<i64>() {
                Ok(id) => {
                    *self.active.write() = Some(id);
                    tracing::info!(branch_id = id, "Restored active branch");
                }
                Err(_) => {
                    tracing::warn!(value = %value, "Ignoring malformed active branch setting")
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load active branch setting"),
        }
    }

    pub fn active_branch_id(&self) -> Option<i64> {
        *self.active.read()
    }

    /// Resolve the active branch row, if one is selected
    pub async fn active_branch(&self) -> AppResult<Option<Branch>> {
        match self.active_branch_id() {
            Some(id) => branch::find_by_id(&self.pool, id).await,
            None => Ok(None),
        }
    }

    /// Switch the active branch for `user_id`.
    ///
    /// Fails with `BusinessRule` when another switch is in flight, and
    /// with `Forbidden` when the caller has no assignment for the target.
    pub async fn switch(&self, user_id: &str, role: Role, target: i64) -> AppResult<Branch> {
        let assignments = branch::assignments_for_user(&self.pool, user_id).await?;
        let available: Vec<i64> = assignments.iter().map(|a| a.branch_id).collect();
        if !super::resolver::can_access_branch(target, role, &available) {
            return Err(AppError::forbidden(format!(
                "No assignment for branch {}",
                target
            )));
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            return Err(AppError::business_rule(
                "Branch switch already in progress",
            ));
        }

        let result = self.switch_inner(user_id, target).await;
        self.in_flight.store(false, Ordering::Release);
        result
    }

    async fn switch_inner(&self, user_id: &str, target: i64) -> AppResult<Branch> {
        let branch = branch::find_by_id(&self.pool, target)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Branch {}", target)))?;
        if !branch.is_active {
            return Err(AppError::business_rule(format!(
                "Branch {} is deactivated",
                target
            )));
        }

        // Optimistic: the pointer moves before any downstream sync runs
        *self.active.write() = Some(target);
        tracing::info!(branch_id = target, user_id = %user_id, "Switched active branch");

        if let Err(e) = app_setting::set(&self.pool, ACTIVE_BRANCH_KEY, &target.to_string()).await {
            tracing::warn!(error = %e, "Failed to persist active branch selection");
        }

        // Best-effort resync; errors are reported, the switch stands
        let hook = Arc::clone(&self.sync_hook);
        tokio::spawn(async move {
            if let Err(e) = hook.resync(target).await {
                tracing::warn!(branch_id = target, error = %e, "Branch resync failed");
            }
        });

        if let Err(e) = audit_log::log_branch_switch(&self.pool, target, user_id).await {
            tracing::warn!(error = %e, "Failed to audit branch switch");
        }

        Ok(branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn in_flight_switch_rejects_a_second_caller() {
        let db = DbService::in_memory().await.unwrap();
        let sw = BranchSwitcher::new(db.pool.clone(), Arc::new(NoopSyncHook));

        // Hold the latch exactly as a switch in progress would
        sw.in_flight.store(true, Ordering::Release);
        let err = sw.switch("admin-1", Role::Admin, 1).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
        assert_eq!(sw.active_branch_id(), None);

        // Released latch: the same call proceeds to branch resolution
        sw.in_flight.store(false, Ordering::Release);
        let err = sw.switch("admin-1", Role::Admin, 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

impl std::fmt::Debug for BranchSwitcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BranchSwitcher")
            .field("active", &self.active_branch_id())
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
