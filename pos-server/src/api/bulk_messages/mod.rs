//! Bulk Message API Module

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/dispatch", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/progress", get(handler::progress))
        .route("/{id}/start", post(handler::start))
        .route("/{id}/pause", post(handler::pause))
        .route("/{id}/cancel", post(handler::cancel))
}
