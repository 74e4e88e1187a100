//! Inventory Ledger Repository
//!
//! `adjust_stock` is the single funnel for every stock mutation in the
//! system: initial stock, order placement, cancellation and manual
//! restock all go through it, so the ledger stays complete and the stock
//! of any book can be reconstructed as the sum of its entries.

use super::{RepoError, RepoResult};
use shared::models::{Book, InventoryLog, InventoryReason};
use sqlx::{SqliteConnection, SqlitePool};

const LOG_SELECT: &str = "SELECT id, book_id, user_id, quantity_change, quantity_after, reason, notes, created_at FROM inventory_log";

/// Apply a signed stock delta and append the matching ledger entry
///
/// Runs on the caller's connection so the stock write and the ledger
/// append always share one commit boundary. The UPDATE is guarded:
/// a delta that would drive stock negative affects no row and the
/// operation fails without side effects.
///
/// `Available`/`OutOfStock` are flipped in the same statement when the
/// stock level crosses zero; manually-set statuses are left alone.
pub async fn adjust_stock(
    conn: &mut SqliteConnection,
    book_id: i64,
    quantity_change: i64,
    reason: InventoryReason,
    actor_id: i64,
    notes: Option<String>,
) -> RepoResult<InventoryLog> {
    if quantity_change == 0 {
        return Err(RepoError::Validation(
            "quantity_change must not be zero".into(),
        ));
    }

    let now = shared::util::now_millis();

    let quantity_after: Option<i64> = sqlx::query_scalar(
        "UPDATE book SET \
            stock_quantity = stock_quantity + ?1, \
            status = CASE \
                WHEN status = 'AVAILABLE' AND stock_quantity + ?1 <= 0 THEN 'OUT_OF_STOCK' \
                WHEN status = 'OUT_OF_STOCK' AND stock_quantity + ?1 > 0 THEN 'AVAILABLE' \
                ELSE status END, \
            updated_at = ?2 \
         WHERE id = ?3 AND stock_quantity + ?1 >= 0 \
         RETURNING stock_quantity",
    )
    .bind(quantity_change)
    .bind(now)
    .bind(book_id)
    .fetch_optional(&mut *conn)
    .await?;

    let quantity_after = match quantity_after {
        Some(q) => q,
        None => {
            // Guard failed: either the book is gone or stock would go negative
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM book WHERE id = ?")
                .bind(book_id)
                .fetch_optional(&mut *conn)
                .await?;
            return Err(match exists {
                Some(_) => RepoError::InsufficientStock(book_id),
                None => RepoError::NotFound(format!("Book {book_id} not found")),
            });
        }
    };

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO inventory_log (book_id, user_id, quantity_change, quantity_after, reason, notes, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING id",
    )
    .bind(book_id)
    .bind(actor_id)
    .bind(quantity_change)
    .bind(quantity_after)
    .bind(reason)
    .bind(&notes)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(InventoryLog {
        id,
        book_id,
        user_id: actor_id,
        quantity_change,
        quantity_after,
        reason,
        notes,
        created_at: now,
    })
}

/// Manual stock adjustment in its own transaction
pub async fn apply_manual_adjustment(
    pool: &SqlitePool,
    book_id: i64,
    quantity_change: i64,
    actor_id: i64,
    notes: Option<String>,
) -> RepoResult<InventoryLog> {
    let mut tx = pool.begin().await?;
    let entry = adjust_stock(
        &mut *tx,
        book_id,
        quantity_change,
        InventoryReason::ManualAdjustment,
        actor_id,
        notes,
    )
    .await?;
    tx.commit().await?;
    Ok(entry)
}

/// Books whose stock has fallen below the threshold (operational alert)
pub async fn find_low_stock(pool: &SqlitePool, threshold: i64) -> RepoResult<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(
        "SELECT id, isbn, title, author, description, price_cents, stock_quantity, status, category_id, created_at, updated_at \
         FROM book WHERE stock_quantity < ? AND status != 'DISCONTINUED' ORDER BY stock_quantity, title",
    )
    .bind(threshold)
    .fetch_all(pool)
    .await?;
    Ok(books)
}

/// Ledger entries for one book, newest first
pub async fn find_logs_by_book(
    pool: &SqlitePool,
    book_id: i64,
    limit: i32,
    offset: i32,
) -> RepoResult<Vec<InventoryLog>> {
    let sql = format!(
        "{} WHERE book_id = ? ORDER BY id DESC LIMIT ? OFFSET ?",
        LOG_SELECT
    );
    let logs = sqlx::query_as::<_, InventoryLog>(&sql)
        .bind(book_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(logs)
}

/// All ledger entries, newest first
pub async fn find_all_logs(
    pool: &SqlitePool,
    limit: i32,
    offset: i32,
) -> RepoResult<Vec<InventoryLog>> {
    let sql = format!("{} ORDER BY id DESC LIMIT ? OFFSET ?", LOG_SELECT);
    let logs = sqlx::query_as::<_, InventoryLog>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(logs)
}

/// Sum of all ledger deltas for a book
///
/// Always equals the book's current stock_quantity; used by tests and
/// consistency checks.
pub async fn ledger_sum(pool: &SqlitePool, book_id: i64) -> RepoResult<i64> {
    let sum: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity_change), 0) FROM inventory_log WHERE book_id = ?",
    )
    .bind(book_id)
    .fetch_one(pool)
    .await?;
    Ok(sum)
}
