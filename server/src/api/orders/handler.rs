//! Order API Handlers
//!
//! Checkout, order listing, status transitions, cancellation and the
//! payment record endpoints. All mutations go through the workflow
//! engine in [`crate::orders::workflow`].

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::{CurrentUser, Operation, authorize};
use crate::core::ServerState;
use crate::db::repository::{order, payment};
use crate::orders::workflow;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{
    Order, OrderCreate, OrderDetail, OrderStatus, OrderStatusUpdate, Payment, PaymentStatus,
    PaymentStatusUpdate,
};

/// Query params for order listings
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i32,
    #[serde(default)]
    pub offset: i32,
    /// Status filter, e.g. "PENDING"
    pub status: Option<String>,
}

fn default_limit() -> i32 {
    50
}

fn parse_status_filter(raw: Option<&str>) -> AppResult<Option<OrderStatus>> {
    match raw {
        None => Ok(None),
        Some(s) => OrderStatus::parse(s)
            .map(Some)
            .ok_or_else(|| AppError::invalid(format!("Unknown order status: {s}"))),
    }
}

/// POST /api/orders - checkout the caller's cart
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<OrderDetail>> {
    validate_required_text(&payload.shipping_address, "shipping_address", MAX_ADDRESS_LEN)?;
    validate_required_text(&payload.shipping_phone, "shipping_phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;

    let detail = workflow::checkout(&state.pool, &current_user, payload).await?;
    Ok(Json(detail))
}

/// GET /api/orders - the caller's own orders
pub async fn list_own(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders =
        order::find_by_user(&state.pool, current_user.id, query.limit, query.offset).await?;
    Ok(Json(orders))
}

/// GET /api/orders/all - every order (staff)
pub async fn list_all(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    authorize(&current_user, Operation::ViewAllOrders)?;
    let status = parse_status_filter(query.status.as_deref())?;
    let orders = order::find_all(&state.pool, status, query.limit, query.offset).await?;
    Ok(Json(orders))
}

/// GET /api/orders/{id} - owner or staff
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = workflow::load_detail(&state.pool, id).await?;
    if detail.order.user_id != current_user.id {
        authorize(&current_user, Operation::ViewAllOrders)?;
    }
    Ok(Json(detail))
}

/// PUT /api/orders/{id}/status - staff transition
pub async fn update_status(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<OrderDetail>> {
    let detail = workflow::update_status(&state.pool, &current_user, id, payload.status).await?;
    Ok(Json(detail))
}

/// POST /api/orders/{id}/cancel - customer cancellation
pub async fn cancel(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = workflow::cancel_by_customer(&state.pool, &current_user, id).await?;
    Ok(Json(detail))
}

/// GET /api/orders/{id}/payment - owner or staff
pub async fn get_payment(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Payment>> {
    let order_row = order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if order_row.user_id != current_user.id {
        authorize(&current_user, Operation::ViewAllOrders)?;
    }

    let pay = payment::find_by_order(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    Ok(Json(pay))
}

/// PUT /api/payments/{id}/status - staff payment settlement
///
/// Legal moves come from [`PaymentStatus::can_transition_to`]; the
/// update itself is guarded against concurrent writers.
pub async fn update_payment_status(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentStatusUpdate>,
) -> AppResult<Json<Payment>> {
    authorize(&current_user, Operation::UpdatePayment)?;
    validate_optional_text(&payload.transaction_id, "transaction_id", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.failure_reason, "failure_reason", MAX_NOTE_LEN)?;

    let pay = payment::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;

    if !pay.status.can_transition_to(payload.status) {
        return Err(AppError::new(ErrorCode::PaymentInvalidTransition)
            .with_detail("from", pay.status.as_str())
            .with_detail("to", payload.status.as_str()));
    }

    let updated = payment::transition_status_pool(
        &state.pool,
        id,
        pay.status,
        payload.status,
        payload.transaction_id.as_deref(),
        payload.failure_reason.as_deref(),
    )
    .await
    .map_err(|e| match e {
        crate::db::repository::RepoError::Conflict(_) => {
            AppError::new(ErrorCode::OrderConflict)
        }
        other => other.into(),
    })?;

    crate::audit_log!(
        current_user.id,
        "payment_status",
        format!("payment:{id}"),
        format!("{} -> {}", pay.status.as_str(), updated.status.as_str())
    );

    // Completed payments without a settled status are expected for
    // cash-on-delivery; no further bookkeeping happens here.
    if updated.status == PaymentStatus::Completed {
        tracing::info!(payment_id = id, order_id = updated.order_id, "Payment completed");
    }

    Ok(Json(updated))
}
