//! Repository layer
//!
//! One module per table. Functions take a pool reference and map rows to
//! the shared model types; errors surface as `AppError::Database`.

pub mod app_setting;
pub mod audit_log;
pub mod branch;
pub mod bulk_message;
pub mod communication_log;
pub mod customer;
