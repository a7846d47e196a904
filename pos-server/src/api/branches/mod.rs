//! Branch API Module

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/branches", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/current", get(handler::current))
        .route("/assignments", get(handler::my_assignments))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/{id}/switch", post(handler::switch))
        .route("/{id}/sharing", get(handler::sharing))
        .route("/{id}/assignments", post(handler::assign))
}
