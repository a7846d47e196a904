//! Role Model

use serde::{Deserialize, Serialize};

/// Viewer role, resolved by the (out-of-scope) auth layer and forwarded
/// per request. Admin bypasses branch access checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Staff,
}

impl Role {
    /// Lenient parse used for the `x-role` request header
    pub fn parse(value: &str) -> Role {
        match value.to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            _ => Role::Staff,
        }
    }
}
