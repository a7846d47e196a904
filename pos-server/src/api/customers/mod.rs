//! Customer API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/customers", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/inactive", get(handler::list_inactive))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route(
            "/{id}/notes",
            get(handler::list_notes).post(handler::add_note),
        )
}
