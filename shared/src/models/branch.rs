//! Branch Model

use serde::{Deserialize, Serialize};

/// Branch-level data visibility policy.
///
/// - `Shared`: every branch sees the data.
/// - `Isolated`: each branch sees only its own rows.
/// - `Hybrid`: visibility decided per entity type via the share flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum DataIsolationMode {
    #[default]
    Shared,
    Isolated,
    Hybrid,
}

/// Entity types subject to branch data sharing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedEntity {
    Products,
    Customers,
    Inventory,
    Suppliers,
    Categories,
    Employees,
}

impl SharedEntity {
    pub const ALL: [SharedEntity; 6] = [
        SharedEntity::Products,
        SharedEntity::Customers,
        SharedEntity::Inventory,
        SharedEntity::Suppliers,
        SharedEntity::Categories,
        SharedEntity::Employees,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SharedEntity::Products => "products",
            SharedEntity::Customers => "customers",
            SharedEntity::Inventory => "inventory",
            SharedEntity::Suppliers => "suppliers",
            SharedEntity::Categories => "categories",
            SharedEntity::Employees => "employees",
        }
    }
}

/// Branch entity (store location)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Branch {
    pub id: i64,
    pub name: String,
    /// Exactly one branch should be main (not enforced at the DB level)
    pub is_main: bool,
    pub data_isolation_mode: DataIsolationMode,
    // Per-entity share flags, meaningful only in hybrid mode
    pub share_products: bool,
    pub share_customers: bool,
    pub share_inventory: bool,
    pub share_suppliers: bool,
    pub share_categories: bool,
    pub share_employees: bool,
    /// Meaningful only for admin-role viewers
    pub can_view_other_branches: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Branch {
    /// Per-entity share flag (the hybrid-mode decision input)
    pub fn share_flag(&self, entity: SharedEntity) -> bool {
        match entity {
            SharedEntity::Products => self.share_products,
            SharedEntity::Customers => self.share_customers,
            SharedEntity::Inventory => self.share_inventory,
            SharedEntity::Suppliers => self.share_suppliers,
            SharedEntity::Categories => self.share_categories,
            SharedEntity::Employees => self.share_employees,
        }
    }
}

/// Create branch payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchCreate {
    pub name: String,
    pub is_main: Option<bool>,
    pub data_isolation_mode: Option<DataIsolationMode>,
    pub share_products: Option<bool>,
    pub share_customers: Option<bool>,
    pub share_inventory: Option<bool>,
    pub share_suppliers: Option<bool>,
    pub share_categories: Option<bool>,
    pub share_employees: Option<bool>,
    pub can_view_other_branches: Option<bool>,
}

/// Update branch payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchUpdate {
    pub name: Option<String>,
    pub is_main: Option<bool>,
    pub data_isolation_mode: Option<DataIsolationMode>,
    pub share_products: Option<bool>,
    pub share_customers: Option<bool>,
    pub share_inventory: Option<bool>,
    pub share_suppliers: Option<bool>,
    pub share_categories: Option<bool>,
    pub share_employees: Option<bool>,
    pub can_view_other_branches: Option<bool>,
    pub is_active: Option<bool>,
}

/// A user's membership in a branch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserBranchAssignment {
    pub user_id: String,
    pub branch_id: i64,
    pub is_primary: bool,
}
