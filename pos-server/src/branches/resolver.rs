//! Branch Data-Sharing Resolver
//!
//! Pure functions answering "is entity type E visible under branch B for
//! role R". All three resolvers fail open on missing branch context:
//! absence of a branch must never hide data.

use shared::models::{Branch, DataIsolationMode, Role, SharedEntity};

/// Is data of `entity` type visible across branches under `branch`'s policy?
///
/// `None` (no branch context) fails open.
pub fn is_data_shared(branch: Option<&Branch>, entity: SharedEntity) -> bool {
    let Some(branch) = branch else {
        return true;
    };
    match branch.data_isolation_mode {
        DataIsolationMode::Shared => true,
        DataIsolationMode::Isolated => false,
        DataIsolationMode::Hybrid => branch.share_flag(entity),
    }
}

/// SQL fragment restricting rows to the current branch, or the empty
/// string when no restriction applies.
///
/// Unrestricted when there is no branch context, or for admins allowed
/// to view other branches. The branch ID is an `i64`, so inlining it is
/// injection-safe.
pub fn branch_filter_clause(
    branch: Option<&Branch>,
    role: Role,
    can_view_other_branches: bool,
) -> String {
    let Some(branch) = branch else {
        return String::new();
    };
    if role == Role::Admin && can_view_other_branches {
        return String::new();
    }
    format!("(branch_id = {} OR is_shared = 1)", branch.id)
}

/// May a caller with `role` operate under `branch_id`?
///
/// Admins always may; everyone else needs a matching assignment in their
/// pre-resolved `available` set.
pub fn can_access_branch(branch_id: i64, role: Role, available: &[i64]) -> bool {
    role == Role::Admin || available.contains(&branch_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::util::now_millis;

    fn branch(mode: DataIsolationMode) -> Branch {
        Branch {
            id: 42,
            name: "Main Store".to_string(),
            is_main: true,
            data_isolation_mode: mode,
            share_products: true,
            share_customers: false,
            share_inventory: true,
            share_suppliers: false,
            share_categories: true,
            share_employees: false,
            can_view_other_branches: false,
            is_active: true,
            created_at: now_millis(),
            updated_at: now_millis(),
        }
    }

    #[test]
    fn test_shared_mode_ignores_flags() {
        let b = branch(DataIsolationMode::Shared);
        for entity in SharedEntity::ALL {
            assert!(is_data_shared(Some(&b), entity), "{:?}", entity);
        }
    }

    #[test]
    fn test_isolated_mode_hides_everything() {
        let b = branch(DataIsolationMode::Isolated);
        for entity in SharedEntity::ALL {
            assert!(!is_data_shared(Some(&b), entity), "{:?}", entity);
        }
    }

    #[test]
    fn test_hybrid_mode_follows_flags() {
        let b = branch(DataIsolationMode::Hybrid);
        assert!(is_data_shared(Some(&b), SharedEntity::Products));
        assert!(!is_data_shared(Some(&b), SharedEntity::Customers));
        assert!(is_data_shared(Some(&b), SharedEntity::Inventory));
        assert!(!is_data_shared(Some(&b), SharedEntity::Employees));
    }

    #[test]
    fn test_missing_branch_fails_open() {
        assert!(is_data_shared(None, SharedEntity::Customers));
        assert_eq!(branch_filter_clause(None, Role::Staff, false), "");
    }

    #[test]
    fn test_filter_clause_scopes_to_branch() {
        let b = branch(DataIsolationMode::Isolated);
        assert_eq!(
            branch_filter_clause(Some(&b), Role::Staff, false),
            "(branch_id = 42 OR is_shared = 1)"
        );
        // Admin without the override is still scoped
        assert_eq!(
            branch_filter_clause(Some(&b), Role::Admin, false),
            "(branch_id = 42 OR is_shared = 1)"
        );
    }

    #[test]
    fn test_filter_clause_admin_override() {
        let b = branch(DataIsolationMode::Isolated);
        assert_eq!(branch_filter_clause(Some(&b), Role::Admin, true), "");
    }

    #[test]
    fn test_can_access_branch() {
        assert!(can_access_branch(7, Role::Admin, &[]));
        assert!(can_access_branch(7, Role::Staff, &[3, 7]));
        assert!(!can_access_branch(7, Role::Staff, &[3, 5]));
        assert!(!can_access_branch(7, Role::Manager, &[]));
    }
}
