//! Branch data scoping
//!
//! - [`resolver`] - pure visibility rules (isolation modes, filter
//!   clauses, access checks)
//! - [`switcher`] - the active-branch switch flow (single-flight latch,
//!   optimistic pointer update, best-effort resync and audit)

pub mod resolver;
pub mod switcher;

pub use switcher::{BranchSwitcher, BranchSyncHook, NoopSyncHook};
