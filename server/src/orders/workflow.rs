//! Order Workflow Engine
//!
//! Converts a cart into an immutable order snapshot and drives the order
//! through its status state machine. Every entry point runs in a single
//! database transaction: the stock writes, the ledger appends, the order
//! and payment rows, and the cart clear either all commit or none do.
//!
//! Authorization is checked once per entry point through
//! [`crate::auth::authorize`]; ownership rules live here.

use sqlx::SqlitePool;

use crate::auth::{CurrentUser, Operation, authorize};
use crate::db::repository::{RepoError, cart, inventory, order, payment};
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{
    InventoryReason, Order, OrderCreate, OrderDetail, OrderStatus, PaymentStatus,
};

/// Load an order together with its items and payment record
pub async fn load_detail(pool: &SqlitePool, order_id: i64) -> AppResult<OrderDetail> {
    let order_row = order::find_by_id(pool, order_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let items = order::find_items(pool, order_id)
        .await
        .map_err(AppError::from)?;
    let payment_row = payment::find_by_order(pool, order_id)
        .await
        .map_err(AppError::from)?;
    Ok(OrderDetail {
        order: order_row,
        items,
        payment: payment_row,
    })
}

/// Place an order from the caller's cart
///
/// For each cart line, atomically: decrement the book's stock (guarded),
/// append the ledger entry, snapshot title and price into an order item.
/// Then create the order (Pending), the payment record (Pending) and
/// clear the cart. Any failure rolls the whole transaction back.
///
/// Errors: `CartEmpty`, `BookUnavailable`, `InsufficientStock{book_id}`,
/// `StockConflict` when a concurrent checkout wins the race.
pub async fn checkout(
    pool: &SqlitePool,
    user: &CurrentUser,
    payload: OrderCreate,
) -> AppResult<OrderDetail> {
    authorize(user, Operation::PlaceOrder)?;

    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    // Cart-to-order conversion: re-validate against live book rows
    let lines = cart::find_lines_tx(&mut tx, user.id).await?;
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::CartEmpty));
    }

    for line in &lines {
        if !line.book_status.is_purchasable() {
            return Err(AppError::new(ErrorCode::BookUnavailable)
                .with_detail("book_id", line.book_id)
                .with_detail("status", line.book_status.as_str()));
        }
    }

    let now = shared::util::now_millis();
    let order_id = shared::util::snowflake_id();
    let order_no = order::next_order_no(&mut tx, now).await?;

    let mut total_cents: i64 = 0;
    for line in &lines {
        // Guarded decrement + ledger append; fails the whole checkout when
        // another buyer got there first
        inventory::adjust_stock(
            &mut tx,
            line.book_id,
            -line.quantity,
            InventoryReason::OrderPlaced,
            user.id,
            Some(format!("Order {order_no}")),
        )
        .await?;

        order::insert_item(
            &mut tx,
            order_id,
            line.book_id,
            &line.title,
            line.quantity,
            line.price_cents,
        )
        .await?;

        total_cents += line.line_total_cents();
    }

    order::insert_order(
        &mut tx,
        order_id,
        &order_no,
        user.id,
        total_cents,
        &payload.shipping_address,
        &payload.shipping_phone,
        payload.note.as_deref(),
        now,
    )
    .await?;

    payment::insert(&mut tx, order_id, payload.payment_method, total_cents, now).await?;

    cart::clear_tx(&mut tx, user.id).await?;

    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        order_id,
        order_no = %order_no,
        user_id = user.id,
        total_cents,
        lines = lines.len(),
        "Order placed"
    );

    load_detail(pool, order_id).await
}

/// Staff-driven status transition
///
/// Legal moves come from [`OrderStatus::can_transition_to`]. Shipping and
/// delivery stamp their timestamps; cancellation restores stock through
/// the ledger and settles the payment record, all in one transaction.
pub async fn update_status(
    pool: &SqlitePool,
    user: &CurrentUser,
    order_id: i64,
    new_status: OrderStatus,
) -> AppResult<OrderDetail> {
    authorize(user, Operation::UpdateOrderStatus)?;

    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    let order_row = order::find_by_id_tx(&mut tx, order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    if !order_row.status.can_transition_to(new_status) {
        return Err(AppError::invalid_transition(
            order_row.status.as_str(),
            new_status.as_str(),
        ));
    }

    if new_status == OrderStatus::Cancelled {
        restore_stock_and_settle_payment(&mut tx, &order_row, user.id).await?;
    }

    let now = shared::util::now_millis();
    let transitioned =
        order::transition_status(&mut tx, order_id, order_row.status, new_status, now).await?;
    if !transitioned {
        // The pinned-status guard failed: someone moved the order first
        return Err(AppError::new(ErrorCode::OrderConflict));
    }

    tx.commit().await.map_err(RepoError::from)?;

    crate::audit_log!(
        user.id,
        "order_status",
        format!("order:{order_id}"),
        format!("{} -> {}", order_row.status.as_str(), new_status.as_str())
    );

    load_detail(pool, order_id).await
}

/// Customer-initiated cancellation
///
/// Only the order's owner may cancel, and only while the order is still
/// Pending or Processing.
pub async fn cancel_by_customer(
    pool: &SqlitePool,
    user: &CurrentUser,
    order_id: i64,
) -> AppResult<OrderDetail> {
    authorize(user, Operation::CancelOwnOrder)?;

    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    let order_row = order::find_by_id_tx(&mut tx, order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    if order_row.user_id != user.id {
        return Err(AppError::forbidden("Order belongs to another user"));
    }
    if !order_row.status.is_cancellable() {
        return Err(AppError::not_cancellable(order_row.status.as_str()));
    }

    restore_stock_and_settle_payment(&mut tx, &order_row, user.id).await?;

    let now = shared::util::now_millis();
    let transitioned = order::transition_status(
        &mut tx,
        order_id,
        order_row.status,
        OrderStatus::Cancelled,
        now,
    )
    .await?;
    if !transitioned {
        return Err(AppError::new(ErrorCode::OrderConflict));
    }

    tx.commit().await.map_err(RepoError::from)?;

    crate::audit_log!(user.id, "order_cancel", format!("order:{order_id}"));

    load_detail(pool, order_id).await
}

/// Reverse the original stock decrement and settle the payment
///
/// Every order item gets a positive ledger entry; the payment moves
/// Pending→Failed or Completed→Refunded. Runs on the open cancellation
/// transaction.
async fn restore_stock_and_settle_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    order_row: &Order,
    actor_id: i64,
) -> AppResult<()> {
    let items = order::find_items_tx(&mut *tx, order_row.id).await?;

    for item in &items {
        inventory::adjust_stock(
            &mut *tx,
            item.book_id,
            item.quantity,
            InventoryReason::OrderCancelled,
            actor_id,
            Some(format!("Order {}", order_row.order_no)),
        )
        .await?;
    }

    if let Some(pay) = payment::find_by_order_tx(&mut *tx, order_row.id).await? {
        let settled = match pay.status {
            PaymentStatus::Pending => {
                payment::transition_status(
                    &mut *tx,
                    pay.id,
                    PaymentStatus::Pending,
                    PaymentStatus::Failed,
                    None,
                    Some("Order cancelled"),
                )
                .await?
            }
            PaymentStatus::Completed => {
                payment::transition_status(
                    &mut *tx,
                    pay.id,
                    PaymentStatus::Completed,
                    PaymentStatus::Refunded,
                    None,
                    None,
                )
                .await?
            }
            // Failed / Refunded payments have nothing left to settle
            _ => true,
        };
        if !settled {
            return Err(AppError::new(ErrorCode::OrderConflict));
        }
    }

    Ok(())
}
