//! Utility module - common helpers and types
//!
//! - [`AppError`] / [`AppResult`] - application error types
//! - [`AppResponse`] - API response envelope
//! - [`QueryBuilder`] - dynamic WHERE-clause construction
//! - logging setup

pub mod error;
pub mod logger;
pub mod query_builder;

pub use error::{AppError, AppResponse, AppResult, ok, ok_with_message};
pub use query_builder::QueryBuilder;
