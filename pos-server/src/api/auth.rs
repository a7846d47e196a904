//! Request Identity
//!
//! Authentication lives in the gateway in front of this service; it
//! forwards the resolved identity as `x-user-id` / `x-role` headers.
//! Handlers pull a [`CurrentUser`] out of those headers.

use axum::extract::FromRequestParts;
use http::request::Parts;
use shared::models::Role;

use crate::utils::AppError;

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub role: Role,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::forbidden("Missing x-user-id header"))?
            .to_string();

        let role = parts
            .headers
            .get("x-role")
            .and_then(|v| v.to_str().ok())
            .map(Role::parse)
            .unwrap_or_default();

        Ok(CurrentUser { id, role })
    }
}
