//! Customer Repository

use crate::segmentation;
use crate::utils::{AppResult, QueryBuilder};
use shared::models::{
    ColorTag, Customer, CustomerCreate, CustomerNote, CustomerUpdate, LoyaltyLevel,
};
use sqlx::SqlitePool;

const CUSTOMER_SELECT: &str = "SELECT id, name, phone, email, color_tag, loyalty_level, last_visit, is_active, branch_id, is_shared, created_at, updated_at FROM customer";

/// Segment filters for customer listing. `branch_clause` comes from the
/// branch resolver and is already restricted to integer IDs.
#[derive(Debug, Default)]
pub struct CustomerFilter {
    pub color_tag: Option<ColorTag>,
    pub loyalty_level: Option<LoyaltyLevel>,
    pub active: Option<bool>,
    pub search: Option<String>,
    pub branch_clause: String,
}

// Text forms for the dynamic filter; column writes bind the enums
// directly via their sqlx::Type encoding.
fn tag_as_str(tag: ColorTag) -> &'static str {
    match tag {
        ColorTag::New => "new",
        ColorTag::Vip => "vip",
        ColorTag::Complainer => "complainer",
        ColorTag::Purchased => "purchased",
    }
}

fn loyalty_as_str(level: LoyaltyLevel) -> &'static str {
    match level {
        LoyaltyLevel::Interested => "interested",
        LoyaltyLevel::Bronze => "bronze",
        LoyaltyLevel::Silver => "silver",
        LoyaltyLevel::Gold => "gold",
        LoyaltyLevel::Platinum => "platinum",
    }
}

pub async fn find_all(pool: &SqlitePool, filter: &CustomerFilter) -> AppResult<Vec<Customer>> {
    let mut qb = QueryBuilder::new();

    if let Some(tag) = filter.color_tag {
        qb.add_condition("color_tag = ?")
            .bind_text(tag_as_str(tag).to_string());
    }
    if let Some(level) = filter.loyalty_level {
        qb.add_condition("loyalty_level = ?")
            .bind_text(loyalty_as_str(level).to_string());
    }
    if let Some(active) = filter.active {
        qb.add_condition(if active { "is_active = 1" } else { "is_active = 0" });
    }
    if let Some(search) = filter.search.as_deref()
        && !search.is_empty()
    {
        qb.add_search_condition(&["name", "phone", "email"], search);
    }
    if !filter.branch_clause.is_empty() {
        qb.add_condition(&filter.branch_clause);
    }

    let sql = format!(
        "{}{} ORDER BY created_at DESC",
        CUSTOMER_SELECT,
        qb.build_where_clause()
    );
    let rows = qb
        .apply_bindings_as(sqlx::query_as::<_, Customer>(&sql))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Customer>> {
    let sql = format!("{} WHERE id = ?", CUSTOMER_SELECT);
    let row = sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Customers whose last visit fell outside the 365-day window
pub async fn find_inactive_365d(pool: &SqlitePool, now: i64) -> AppResult<Vec<Customer>> {
    let sql = format!(
        "{} WHERE last_visit IS NOT NULL AND ? - last_visit > ? ORDER BY last_visit ASC",
        CUSTOMER_SELECT
    );
    let rows = sqlx::query_as::<_, Customer>(&sql)
        .bind(now)
        .bind(segmentation::INACTIVE_WINDOW_MS)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: CustomerCreate, is_active: bool) -> AppResult<Customer> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    // New customers always start tagged "new"
    sqlx::query(
        "INSERT INTO customer (id, name, phone, email, color_tag, loyalty_level, last_visit, is_active, branch_id, is_shared, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 'new', ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(data.loyalty_level.unwrap_or_default())
    .bind(data.last_visit)
    .bind(is_active)
    .bind(data.branch_id)
    .bind(data.is_shared.unwrap_or(false))
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| crate::utils::AppError::database("Customer vanished after insert"))
}

/// Apply a partial update together with the derived classification.
///
/// `color_tag` and `is_active` are always written; the caller derives
/// them from the classifier before calling.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: &CustomerUpdate,
    color_tag: ColorTag,
    is_active: bool,
) -> AppResult<Option<Customer>> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE customer SET \
            name = COALESCE(?1, name), \
            phone = COALESCE(?2, phone), \
            email = COALESCE(?3, email), \
            loyalty_level = COALESCE(?4, loyalty_level), \
            last_visit = COALESCE(?5, last_visit), \
            is_shared = COALESCE(?6, is_shared), \
            color_tag = ?7, \
            is_active = ?8, \
            updated_at = ?9 \
         WHERE id = ?10",
    )
    .bind(&data.name)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(data.loyalty_level)
    .bind(data.last_visit)
    .bind(data.is_shared)
    .bind(color_tag)
    .bind(is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Flip just the `is_active` flag (the reconciliation write)
pub async fn set_active(pool: &SqlitePool, id: i64, is_active: bool) -> AppResult<Option<Customer>> {
    let now = shared::util::now_millis();
    sqlx::query("UPDATE customer SET is_active = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(is_active)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    find_by_id(pool, id).await
}

/// Deactivate customers whose 90-day window lapsed without an update.
/// Returns the number of rows decayed.
pub async fn decay_stale_active(pool: &SqlitePool, now: i64) -> AppResult<u64> {
    let result = sqlx::query(
        "UPDATE customer SET is_active = 0, updated_at = ?1 \
         WHERE is_active = 1 AND last_visit IS NOT NULL AND ?1 - last_visit >= ?2",
    )
    .bind(now)
    .bind(segmentation::ACTIVE_WINDOW_MS)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn add_note(pool: &SqlitePool, customer_id: i64, content: &str) -> AppResult<CustomerNote> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query("INSERT INTO customer_note (id, customer_id, content, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(id)
        .bind(customer_id)
        .bind(content)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(CustomerNote {
        id,
        customer_id,
        content: content.to_string(),
        created_at: now,
    })
}

pub async fn notes_for(pool: &SqlitePool, customer_id: i64) -> AppResult<Vec<CustomerNote>> {
    let rows = sqlx::query_as::<_, CustomerNote>(
        "SELECT id, customer_id, content, created_at FROM customer_note WHERE customer_id = ? ORDER BY created_at ASC",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
