//! Branch switch flow against an in-memory store.

use async_trait::async_trait;
use std::sync::Arc;

use pos_server::AppError;
use pos_server::branches::{BranchSwitcher, BranchSyncHook, NoopSyncHook};
use pos_server::db::DbService;
use pos_server::db::repository::branch;
use shared::models::{Branch, BranchCreate, BranchUpdate, Role};

async fn seed_branch(pool: &sqlx::SqlitePool, name: &str) -> Branch {
    branch::create(
        pool,
        BranchCreate {
            name: name.to_string(),
            is_main: None,
            data_isolation_mode: None,
            share_products: None,
            share_customers: None,
            share_inventory: None,
            share_suppliers: None,
            share_categories: None,
            share_employees: None,
            can_view_other_branches: None,
        },
    )
    .await
    .unwrap()
}

fn switcher(pool: sqlx::SqlitePool) -> BranchSwitcher {
    BranchSwitcher::new(pool, Arc::new(NoopSyncHook))
}

#[tokio::test]
async fn staff_needs_an_assignment() {
    let db = DbService::in_memory().await.unwrap();
    let target = seed_branch(&db.pool, "Kariakoo").await;
    let sw = switcher(db.pool.clone());

    let err = sw
        .switch("user-1", Role::Staff, target.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(sw.active_branch_id(), None);

    branch::assign_user(&db.pool, "user-1", target.id, true)
        .await
        .unwrap();
    let switched = sw.switch("user-1", Role::Staff, target.id).await.unwrap();
    assert_eq!(switched.id, target.id);
    assert_eq!(sw.active_branch_id(), Some(target.id));
}

#[tokio::test]
async fn admin_bypasses_assignments() {
    let db = DbService::in_memory().await.unwrap();
    let target = seed_branch(&db.pool, "Mbezi").await;
    let sw = switcher(db.pool.clone());

    let switched = sw.switch("admin-1", Role::Admin, target.id).await.unwrap();
    assert_eq!(switched.id, target.id);
}

#[tokio::test]
async fn unknown_and_deactivated_branches_are_rejected() {
    let db = DbService::in_memory().await.unwrap();
    let sw = switcher(db.pool.clone());

    let err = sw.switch("admin-1", Role::Admin, 999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let target = seed_branch(&db.pool, "Tegeta").await;
    branch::update(
        &db.pool,
        target.id,
        &BranchUpdate {
            is_active: Some(false),
            ..BranchUpdate::default()
        },
    )
    .await
    .unwrap();

    let err = sw
        .switch("admin-1", Role::Admin, target.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
    // Rejected switch leaves the pointer untouched
    assert_eq!(sw.active_branch_id(), None);
}

#[tokio::test]
async fn selection_survives_a_restart() {
    let db = DbService::in_memory().await.unwrap();
    let target = seed_branch(&db.pool, "Main").await;

    let sw = switcher(db.pool.clone());
    sw.switch("admin-1", Role::Admin, target.id).await.unwrap();

    // New instance over the same store, as after a process restart
    let restarted = switcher(db.pool.clone());
    assert_eq!(restarted.active_branch_id(), None);
    restarted.restore().await;
    assert_eq!(restarted.active_branch_id(), Some(target.id));
}

#[tokio::test]
async fn selection_survives_a_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("dukani.db");
    let db_path = db_path.to_str().unwrap();

    let target_id = {
        let db = DbService::new(db_path).await.unwrap();
        let target = seed_branch(&db.pool, "Main").await;
        let sw = switcher(db.pool.clone());
        sw.switch("admin-1", Role::Admin, target.id).await.unwrap();
        db.pool.close().await;
        target.id
    };

    let db = DbService::new(db_path).await.unwrap();
    let restarted = switcher(db.pool.clone());
    restarted.restore().await;
    assert_eq!(restarted.active_branch_id(), Some(target_id));
}

struct RecordingHook {
    tx: tokio::sync::mpsc::UnboundedSender<i64>,
}

#[async_trait]
impl BranchSyncHook for RecordingHook {
    async fn resync(&self, branch_id: i64) -> anyhow::Result<()> {
        let _ = self.tx.send(branch_id);
        Ok(())
    }
}

#[tokio::test]
async fn switch_triggers_the_resync_hook() {
    let db = DbService::in_memory().await.unwrap();
    let target = seed_branch(&db.pool, "Main").await;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let sw = BranchSwitcher::new(db.pool.clone(), Arc::new(RecordingHook { tx }));
    sw.switch("admin-1", Role::Admin, target.id).await.unwrap();

    let resynced = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
        .await
        .expect("resync hook never fired")
        .expect("hook channel closed");
    assert_eq!(resynced, target.id);
}

#[tokio::test]
async fn switch_writes_an_audit_row() {
    let db = DbService::in_memory().await.unwrap();
    let target = seed_branch(&db.pool, "Main").await;
    let sw = switcher(db.pool.clone());

    sw.switch("admin-1", Role::Admin, target.id).await.unwrap();

    let (action, operator): (String, Option<String>) = sqlx::query_as(
        "SELECT action, operator_id FROM audit_log ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_one(&db.pool)
    .await
    .unwrap();
    assert_eq!(action, "branch_switch");
    assert_eq!(operator.as_deref(), Some("admin-1"));
}
