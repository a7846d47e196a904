//! API Route Modules
//!
//! - [`health`] - health check
//! - [`customers`] - customer CRM endpoints (segment filters, notes)
//! - [`branches`] - branch management, data-sharing policy, switch flow
//! - [`bulk_messages`] - dispatch job endpoints

pub mod auth;
pub mod branches;
pub mod bulk_messages;
pub mod customers;
pub mod health;

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub use crate::utils::{AppResponse, AppResult};
pub use auth::CurrentUser;

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// All routes, no middleware and no state applied
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(customers::router())
        .merge(branches::router())
        .merge(bulk_messages::router())
        .merge(health::router())
}

/// Fully configured application with middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .with_state(state)
}
