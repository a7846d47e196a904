//! Shared types for the Dukani POS/CRM server
//!
//! Data models and utility functions used by the server crate and,
//! via JSON, the web frontend.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
