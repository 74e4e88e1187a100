//! Payment Repository
//!
//! One payment row per order (order_id UNIQUE); created Pending at
//! checkout, updated by staff or the cancellation path.

use super::{RepoError, RepoResult};
use shared::models::{Payment, PaymentMethod, PaymentStatus};
use sqlx::{SqliteConnection, SqlitePool};

const PAYMENT_SELECT: &str = "SELECT id, order_id, method, amount_cents, status, transaction_id, failure_reason, created_at, updated_at FROM payment";

/// Create the Pending payment record (checkout transaction only)
pub async fn insert(
    conn: &mut SqliteConnection,
    order_id: i64,
    method: PaymentMethod,
    amount_cents: i64,
    now: i64,
) -> RepoResult<i64> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO payment (id, order_id, method, amount_cents, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5, ?5)",
    )
    .bind(id)
    .bind(order_id)
    .bind(method)
    .bind(amount_cents)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(id)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Payment>> {
    let sql = format!("{} WHERE id = ?", PAYMENT_SELECT);
    let payment = sqlx::query_as::<_, Payment>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(payment)
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<Payment>> {
    let sql = format!("{} WHERE order_id = ?", PAYMENT_SELECT);
    let payment = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    Ok(payment)
}

/// Payment row on the workflow transaction's connection
pub async fn find_by_order_tx(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Option<Payment>> {
    let sql = format!("{} WHERE order_id = ?", PAYMENT_SELECT);
    let payment = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

/// Guarded payment status transition
///
/// The WHERE clause pins the expected current status; zero affected rows
/// means the payment was updated concurrently.
pub async fn transition_status(
    conn: &mut SqliteConnection,
    payment_id: i64,
    from: PaymentStatus,
    to: PaymentStatus,
    transaction_id: Option<&str>,
    failure_reason: Option<&str>,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE payment SET status = ?1, transaction_id = COALESCE(?2, transaction_id), failure_reason = COALESCE(?3, failure_reason), updated_at = ?4 WHERE id = ?5 AND status = ?6",
    )
    .bind(to)
    .bind(transaction_id)
    .bind(failure_reason)
    .bind(now)
    .bind(payment_id)
    .bind(from)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Pool variant of [`transition_status`] for the staff endpoint
pub async fn transition_status_pool(
    pool: &SqlitePool,
    payment_id: i64,
    from: PaymentStatus,
    to: PaymentStatus,
    transaction_id: Option<&str>,
    failure_reason: Option<&str>,
) -> RepoResult<Payment> {
    let mut conn = pool.acquire().await?;
    let updated = transition_status(
        &mut *conn,
        payment_id,
        from,
        to,
        transaction_id,
        failure_reason,
    )
    .await?;
    if !updated {
        return Err(RepoError::Conflict(format!(
            "Payment {payment_id} was updated concurrently"
        )));
    }
    find_by_id(pool, payment_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Payment {payment_id} not found")))
}
