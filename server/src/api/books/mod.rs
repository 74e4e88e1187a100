//! Book API module

mod handler;

use axum::{
    Router,
    routing::get,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/books", routes())
}

fn routes() -> Router<ServerState> {
    // Reads are public; writes check catalog:manage through authorize()
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        // Static segments before /{id} to avoid path conflicts
        .route("/search", get(handler::search))
        .route("/by-category/{category_id}", get(handler::list_by_category))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
