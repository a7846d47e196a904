//! Customer Model

use serde::{Deserialize, Serialize};

/// Derived classification label driving UI treatment and messaging
/// segment filters.
///
/// Only `New`, `Vip` and `Complainer` are produced by the classifier;
/// `Purchased` is assigned by the sales flow and passes through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum ColorTag {
    #[default]
    New,
    Vip,
    Complainer,
    Purchased,
}

/// Loyalty tier. Assigned externally (never derived); consumed by
/// messaging segment filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum LoyaltyLevel {
    #[default]
    Interested,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// Customer entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub color_tag: ColorTag,
    pub loyalty_level: LoyaltyLevel,
    /// Millisecond timestamp of the last qualifying transaction
    pub last_visit: Option<i64>,
    pub is_active: bool,
    /// Owning branch; `NULL` means the record predates branch scoping
    pub branch_id: Option<i64>,
    /// Row-level share flag consulted by the branch visibility filter
    pub is_shared: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A note attached to a customer. Note content doubles as the activity
/// record the classifier reads ("checked in" / complaint markers).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CustomerNote {
    pub id: i64,
    pub customer_id: i64,
    pub content: String,
    pub created_at: i64,
}

/// Create customer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCreate {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub loyalty_level: Option<LoyaltyLevel>,
    pub last_visit: Option<i64>,
    pub branch_id: Option<i64>,
    pub is_shared: Option<bool>,
}

/// Update customer payload
///
/// `color_tag` and `is_active` are absent on purpose: both are derived
/// server-side on every update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub loyalty_level: Option<LoyaltyLevel>,
    pub last_visit: Option<i64>,
    pub is_shared: Option<bool>,
}
