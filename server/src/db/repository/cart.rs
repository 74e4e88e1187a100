//! Cart Repository

use super::{RepoError, RepoResult};
use shared::models::{CartItem, CartLine};
use sqlx::{SqliteConnection, SqlitePool};

const LINE_SELECT: &str = "SELECT c.book_id, b.title, b.price_cents, b.stock_quantity, b.status AS book_status, c.quantity \
     FROM cart_item c JOIN book b ON c.book_id = b.id";

pub async fn find_items(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<CartItem>> {
    let items = sqlx::query_as::<_, CartItem>(
        "SELECT id, user_id, book_id, quantity, created_at, updated_at FROM cart_item WHERE user_id = ? ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Cart lines joined with live book data (for display)
pub async fn find_lines(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<CartLine>> {
    let sql = format!("{} WHERE c.user_id = ? ORDER BY c.created_at", LINE_SELECT);
    let lines = sqlx::query_as::<_, CartLine>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(lines)
}

/// Cart lines on the checkout transaction's connection
///
/// Cart-to-order conversion re-reads stock here, inside the transaction,
/// so stale cart data can never oversell.
pub async fn find_lines_tx(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> RepoResult<Vec<CartLine>> {
    let sql = format!("{} WHERE c.user_id = ? ORDER BY c.created_at", LINE_SELECT);
    let lines = sqlx::query_as::<_, CartLine>(&sql)
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

/// Put a book in the cart; a second add replaces the line's quantity
pub async fn upsert_item(
    pool: &SqlitePool,
    user_id: i64,
    book_id: i64,
    quantity: i64,
) -> RepoResult<CartItem> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    sqlx::query(
        "INSERT INTO cart_item (id, user_id, book_id, quantity, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
         ON CONFLICT (user_id, book_id) DO UPDATE SET quantity = excluded.quantity, updated_at = excluded.updated_at",
    )
    .bind(id)
    .bind(user_id)
    .bind(book_id)
    .bind(quantity)
    .bind(now)
    .execute(pool)
    .await?;

    find_item(pool, user_id, book_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to upsert cart item".into()))
}

pub async fn find_item(
    pool: &SqlitePool,
    user_id: i64,
    book_id: i64,
) -> RepoResult<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
        "SELECT id, user_id, book_id, quantity, created_at, updated_at FROM cart_item WHERE user_id = ? AND book_id = ?",
    )
    .bind(user_id)
    .bind(book_id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

pub async fn update_quantity(
    pool: &SqlitePool,
    user_id: i64,
    book_id: i64,
    quantity: i64,
) -> RepoResult<CartItem> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE cart_item SET quantity = ?1, updated_at = ?2 WHERE user_id = ?3 AND book_id = ?4",
    )
    .bind(quantity)
    .bind(now)
    .bind(user_id)
    .bind(book_id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Cart item for book {book_id} not found"
        )));
    }
    find_item(pool, user_id, book_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Cart item for book {book_id} not found")))
}

pub async fn remove_item(pool: &SqlitePool, user_id: i64, book_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE user_id = ? AND book_id = ?")
        .bind(user_id)
        .bind(book_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn clear(pool: &SqlitePool, user_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected())
}

/// Clear the cart on the checkout transaction's connection
pub async fn clear_tx(conn: &mut SqliteConnection, user_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE user_id = ?")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected())
}
