//! Book Repository

use super::{RepoError, RepoResult, inventory};
use shared::models::{Book, BookCreate, BookStatus, BookUpdate, InventoryReason};
use sqlx::SqlitePool;

const BOOK_SELECT: &str = "SELECT id, isbn, title, author, description, price_cents, stock_quantity, status, category_id, created_at, updated_at FROM book";

/// All books still in the catalog (discontinued titles are hidden)
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Book>> {
    let sql = format!("{} WHERE status != 'DISCONTINUED' ORDER BY title", BOOK_SELECT);
    let books = sqlx::query_as::<_, Book>(&sql).fetch_all(pool).await?;
    Ok(books)
}

pub async fn find_by_category(pool: &SqlitePool, category_id: i64) -> RepoResult<Vec<Book>> {
    let sql = format!(
        "{} WHERE category_id = ? AND status != 'DISCONTINUED' ORDER BY title",
        BOOK_SELECT
    );
    let books = sqlx::query_as::<_, Book>(&sql)
        .bind(category_id)
        .fetch_all(pool)
        .await?;
    Ok(books)
}

/// Title / author / ISBN substring search
pub async fn search(pool: &SqlitePool, query: &str) -> RepoResult<Vec<Book>> {
    let pattern = format!("%{query}%");
    let sql = format!(
        "{} WHERE status != 'DISCONTINUED' AND (title LIKE ?1 OR author LIKE ?1 OR isbn LIKE ?1) ORDER BY title",
        BOOK_SELECT
    );
    let books = sqlx::query_as::<_, Book>(&sql)
        .bind(&pattern)
        .fetch_all(pool)
        .await?;
    Ok(books)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Book>> {
    let sql = format!("{} WHERE id = ?", BOOK_SELECT);
    let book = sqlx::query_as::<_, Book>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(book)
}

pub async fn find_by_isbn(pool: &SqlitePool, isbn: &str) -> RepoResult<Option<Book>> {
    let sql = format!("{} WHERE isbn = ? LIMIT 1", BOOK_SELECT);
    let book = sqlx::query_as::<_, Book>(&sql)
        .bind(isbn)
        .fetch_optional(pool)
        .await?;
    Ok(book)
}

/// Create a book
///
/// The row is inserted with zero stock; the initial stock flows through
/// the inventory ledger in the same transaction so the ledger starts
/// complete for every book.
pub async fn create(pool: &SqlitePool, data: BookCreate, actor_id: i64) -> RepoResult<Book> {
    if find_by_isbn(pool, &data.isbn).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "ISBN '{}' already exists",
            data.isbn
        )));
    }

    // Default status follows the stock level it starts with
    let status = data.status.unwrap_or(if data.initial_stock > 0 {
        BookStatus::Available
    } else {
        BookStatus::OutOfStock
    });
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO book (id, isbn, title, author, description, price_cents, stock_quantity, status, category_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9, ?9)",
    )
    .bind(id)
    .bind(&data.isbn)
    .bind(&data.title)
    .bind(&data.author)
    .bind(&data.description)
    .bind(data.price_cents)
    .bind(status)
    .bind(data.category_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if data.initial_stock > 0 {
        inventory::adjust_stock(
            &mut *tx,
            id,
            data.initial_stock,
            InventoryReason::InitialStock,
            actor_id,
            None,
        )
        .await?;
    }

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create book".into()))
}

/// Update catalog fields (stock is only reachable through the ledger)
pub async fn update(pool: &SqlitePool, id: i64, data: BookUpdate) -> RepoResult<Book> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE book SET isbn = COALESCE(?1, isbn), title = COALESCE(?2, title), author = COALESCE(?3, author), description = COALESCE(?4, description), price_cents = COALESCE(?5, price_cents), status = COALESCE(?6, status), category_id = COALESCE(?7, category_id), updated_at = ?8 WHERE id = ?9",
    )
    .bind(&data.isbn)
    .bind(&data.title)
    .bind(&data.author)
    .bind(&data.description)
    .bind(data.price_cents)
    .bind(data.status)
    .bind(data.category_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Book {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Book {id} not found")))
}

/// Mark a book discontinued
///
/// Rows are never deleted: order items keep referring to the book.
pub async fn discontinue(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE book SET status = 'DISCONTINUED', updated_at = ? WHERE id = ? AND status != 'DISCONTINUED'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
