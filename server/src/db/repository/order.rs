//! Order Repository
//!
//! Reads over the pool; inserts and status writes on the workflow's
//! transaction connection.

use super::RepoResult;
use shared::models::{Order, OrderItem, OrderStatus};
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_SELECT: &str = "SELECT id, order_no, user_id, status, total_cents, shipping_address, shipping_phone, note, ordered_at, shipped_at, delivered_at, created_at, updated_at FROM orders";

const ITEM_SELECT: &str =
    "SELECT id, order_id, book_id, title, quantity, price_cents FROM order_item";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{} WHERE id = ?", ORDER_SELECT);
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(order)
}

/// Read an order on the workflow transaction's connection
pub async fn find_by_id_tx(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{} WHERE id = ?", ORDER_SELECT);
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn find_by_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: i32,
    offset: i32,
) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "{} WHERE user_id = ? ORDER BY ordered_at DESC LIMIT ? OFFSET ?",
        ORDER_SELECT
    );
    let orders = sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(orders)
}

pub async fn find_all(
    pool: &SqlitePool,
    status: Option<OrderStatus>,
    limit: i32,
    offset: i32,
) -> RepoResult<Vec<Order>> {
    let orders = match status {
        Some(status) => {
            let sql = format!(
                "{} WHERE status = ? ORDER BY ordered_at DESC LIMIT ? OFFSET ?",
                ORDER_SELECT
            );
            sqlx::query_as::<_, Order>(&sql)
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                "{} ORDER BY ordered_at DESC LIMIT ? OFFSET ?",
                ORDER_SELECT
            );
            sqlx::query_as::<_, Order>(&sql)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(orders)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{} WHERE order_id = ? ORDER BY id", ITEM_SELECT);
    let items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(items)
}

/// Order items on the workflow transaction's connection
pub async fn find_items_tx(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{} WHERE order_id = ? ORDER BY id", ITEM_SELECT);
    let items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Next order number for the day: ORD-YYYYMMDD-NNNN
///
/// The per-day sequence is computed inside the checkout transaction;
/// SQLite's single-writer discipline keeps it collision-free, and the
/// UNIQUE index on order_no backs that up.
pub async fn next_order_no(conn: &mut SqliteConnection, now_millis: i64) -> RepoResult<String> {
    use chrono::TimeZone;

    let date = chrono::Utc
        .timestamp_millis_opt(now_millis)
        .single()
        .unwrap_or_else(chrono::Utc::now)
        .format("%Y%m%d")
        .to_string();

    let prefix = format!("ORD-{date}-");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE order_no LIKE ?")
        .bind(format!("{prefix}%"))
        .fetch_one(conn)
        .await?;

    Ok(format!("{prefix}{:04}", count + 1))
}

/// Insert the order row (workflow transaction only)
#[allow(clippy::too_many_arguments)]
pub async fn insert_order(
    conn: &mut SqliteConnection,
    id: i64,
    order_no: &str,
    user_id: i64,
    total_cents: i64,
    shipping_address: &str,
    shipping_phone: &str,
    note: Option<&str>,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, order_no, user_id, status, total_cents, shipping_address, shipping_phone, note, ordered_at, created_at, updated_at) \
         VALUES (?1, ?2, ?3, 'PENDING', ?4, ?5, ?6, ?7, ?8, ?8, ?8)",
    )
    .bind(id)
    .bind(order_no)
    .bind(user_id)
    .bind(total_cents)
    .bind(shipping_address)
    .bind(shipping_phone)
    .bind(note)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Insert one order line snapshot (workflow transaction only)
pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    book_id: i64,
    title: &str,
    quantity: i64,
    price_cents: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_item (id, order_id, book_id, title, quantity, price_cents) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(shared::util::snowflake_id())
    .bind(order_id)
    .bind(book_id)
    .bind(title)
    .bind(quantity)
    .bind(price_cents)
    .execute(conn)
    .await?;
    Ok(())
}

/// Guarded status transition (workflow transaction only)
///
/// The WHERE clause pins the expected current status, so a concurrent
/// transition affects zero rows instead of clobbering it.
pub async fn transition_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    let shipped_at = (to == OrderStatus::Shipped).then_some(now);
    let delivered_at = (to == OrderStatus::Delivered).then_some(now);

    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, shipped_at = COALESCE(?2, shipped_at), delivered_at = COALESCE(?3, delivered_at), updated_at = ?4 WHERE id = ?5 AND status = ?6",
    )
    .bind(to)
    .bind(shipped_at)
    .bind(delivered_at)
    .bind(now)
    .bind(order_id)
    .bind(from)
    .execute(conn)
    .await?;

    Ok(rows.rows_affected() > 0)
}
