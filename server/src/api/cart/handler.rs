//! Cart API Handlers
//!
//! Every route operates on the authenticated user's own cart.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{book, cart};
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{
    CartItem, CartItemAdd, CartItemUpdate, CartLine, MAX_CART_QUANTITY, MIN_CART_QUANTITY,
};

/// Cart view: lines plus the running total
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_cents: i64,
}

fn validate_quantity(quantity: i64) -> AppResult<()> {
    if !(MIN_CART_QUANTITY..=MAX_CART_QUANTITY).contains(&quantity) {
        return Err(AppError::new(ErrorCode::CartQuantityInvalid)
            .with_detail("quantity", quantity));
    }
    Ok(())
}

/// GET /api/cart - the caller's cart joined with live book data
pub async fn get_cart(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<CartView>> {
    let lines = cart::find_lines(&state.pool, current_user.id).await?;
    let total_cents = lines.iter().map(CartLine::line_total_cents).sum();
    Ok(Json(CartView { lines, total_cents }))
}

/// POST /api/cart/items - add a book (or replace the line's quantity)
pub async fn add_item(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CartItemAdd>,
) -> AppResult<Json<CartItem>> {
    validate_quantity(payload.quantity)?;

    let found = book::find_by_id(&state.pool, payload.book_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookNotFound))?;
    if !found.status.is_purchasable() {
        return Err(AppError::new(ErrorCode::BookUnavailable)
            .with_detail("book_id", found.id)
            .with_detail("status", found.status.as_str()));
    }

    let item = cart::upsert_item(
        &state.pool,
        current_user.id,
        payload.book_id,
        payload.quantity,
    )
    .await?;
    Ok(Json(item))
}

/// PUT /api/cart/items/{book_id} - change a line's quantity
pub async fn update_item(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(book_id): Path<i64>,
    Json(payload): Json<CartItemUpdate>,
) -> AppResult<Json<CartItem>> {
    validate_quantity(payload.quantity)?;

    let item = cart::update_quantity(&state.pool, current_user.id, book_id, payload.quantity)
        .await
        .map_err(|e| match e {
            crate::db::repository::RepoError::NotFound(_) => {
                AppError::new(ErrorCode::CartItemNotFound)
            }
            other => other.into(),
        })?;
    Ok(Json(item))
}

/// DELETE /api/cart/items/{book_id}
pub async fn remove_item(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(book_id): Path<i64>,
) -> AppResult<Json<bool>> {
    let removed = cart::remove_item(&state.pool, current_user.id, book_id).await?;
    if !removed {
        return Err(AppError::new(ErrorCode::CartItemNotFound));
    }
    Ok(Json(true))
}

/// DELETE /api/cart - empty the cart
pub async fn clear(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<u64>> {
    let removed = cart::clear(&state.pool, current_user.id).await?;
    Ok(Json(removed))
}
