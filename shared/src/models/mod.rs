//! Data models
//!
//! Shared between pos-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), all timestamps are
//! UTC milliseconds.

pub mod branch;
pub mod bulk_message;
pub mod customer;
pub mod role;

// Re-exports
pub use branch::*;
pub use bulk_message::*;
pub use customer::*;
pub use role::*;
