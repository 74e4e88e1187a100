//! Inventory API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/adjust", post(handler::adjust))
        .route("/logs", get(handler::list_logs))
        .route("/low-stock", get(handler::low_stock))
}
