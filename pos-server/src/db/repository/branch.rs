//! Branch Repository

use crate::utils::AppResult;
use shared::models::{Branch, BranchCreate, BranchUpdate, UserBranchAssignment};
use sqlx::SqlitePool;

const BRANCH_SELECT: &str = "SELECT id, name, is_main, data_isolation_mode, share_products, share_customers, share_inventory, share_suppliers, share_categories, share_employees, can_view_other_branches, is_active, created_at, updated_at FROM branch";

pub async fn find_all(pool: &SqlitePool) -> AppResult<Vec<Branch>> {
    let sql = format!("{} WHERE is_active = 1 ORDER BY is_main DESC, name ASC", BRANCH_SELECT);
    let rows = sqlx::query_as::<_, Branch>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Branch>> {
    let sql = format!("{} WHERE id = ?", BRANCH_SELECT);
    let row = sqlx::query_as::<_, Branch>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: BranchCreate) -> AppResult<Branch> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO branch (id, name, is_main, data_isolation_mode, share_products, share_customers, share_inventory, share_suppliers, share_categories, share_employees, can_view_other_branches, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12, ?12)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(data.is_main.unwrap_or(false))
    .bind(data.data_isolation_mode.unwrap_or_default())
    .bind(data.share_products.unwrap_or(true))
    .bind(data.share_customers.unwrap_or(true))
    .bind(data.share_inventory.unwrap_or(true))
    .bind(data.share_suppliers.unwrap_or(true))
    .bind(data.share_categories.unwrap_or(true))
    .bind(data.share_employees.unwrap_or(true))
    .bind(data.can_view_other_branches.unwrap_or(false))
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| crate::utils::AppError::database("Branch vanished after insert"))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &BranchUpdate) -> AppResult<Option<Branch>> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE branch SET \
            name = COALESCE(?1, name), \
            is_main = COALESCE(?2, is_main), \
            data_isolation_mode = COALESCE(?3, data_isolation_mode), \
            share_products = COALESCE(?4, share_products), \
            share_customers = COALESCE(?5, share_customers), \
            share_inventory = COALESCE(?6, share_inventory), \
            share_suppliers = COALESCE(?7, share_suppliers), \
            share_categories = COALESCE(?8, share_categories), \
            share_employees = COALESCE(?9, share_employees), \
            can_view_other_branches = COALESCE(?10, can_view_other_branches), \
            is_active = COALESCE(?11, is_active), \
            updated_at = ?12 \
         WHERE id = ?13",
    )
    .bind(&data.name)
    .bind(data.is_main)
    .bind(data.data_isolation_mode)
    .bind(data.share_products)
    .bind(data.share_customers)
    .bind(data.share_inventory)
    .bind(data.share_suppliers)
    .bind(data.share_categories)
    .bind(data.share_employees)
    .bind(data.can_view_other_branches)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

pub async fn assignments_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Vec<UserBranchAssignment>> {
    let rows = sqlx::query_as::<_, UserBranchAssignment>(
        "SELECT user_id, branch_id, is_primary FROM user_branch_assignment WHERE user_id = ? ORDER BY is_primary DESC, branch_id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn assign_user(
    pool: &SqlitePool,
    user_id: &str,
    branch_id: i64,
    is_primary: bool,
) -> AppResult<UserBranchAssignment> {
    sqlx::query(
        "INSERT INTO user_branch_assignment (user_id, branch_id, is_primary) VALUES (?1, ?2, ?3) \
         ON CONFLICT(user_id, branch_id) DO UPDATE SET is_primary = excluded.is_primary",
    )
    .bind(user_id)
    .bind(branch_id)
    .bind(is_primary)
    .execute(pool)
    .await?;
    Ok(UserBranchAssignment {
        user_id: user_id.to_string(),
        branch_id,
        is_primary,
    })
}
