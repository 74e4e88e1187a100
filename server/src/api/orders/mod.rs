//! Order API module
//!
//! Covers both `/api/orders` and the payment record routes under
//! `/api/payments` — a payment never exists apart from its order.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/orders", order_routes())
        .nest("/api/payments", payment_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_own).post(handler::create))
        // Static segment before /{id} to avoid path conflicts
        .route("/all", get(handler::list_all))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/payment", get(handler::get_payment))
}

fn payment_routes() -> Router<ServerState> {
    Router::new().route("/{id}/status", put(handler::update_payment_status))
}
