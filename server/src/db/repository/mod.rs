//! Repository Module
//!
//! CRUD operations over the SQLite pool. Repositories are plain modules of
//! async functions taking `&SqlitePool`, or `&mut SqliteConnection` where
//! the caller owns the transaction boundary (checkout, cancellation).

pub mod book;
pub mod cart;
pub mod category;
pub mod inventory;
pub mod order;
pub mod payment;
pub mod user;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Insufficient stock for book {0}")]
    InsufficientStock(i64),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return RepoError::Duplicate(db.message().to_string());
            }
            // SQLITE_BUSY surfaces when busy_timeout expires under write
            // contention; the caller lost the race and may retry.
            let msg = db.message();
            if msg.contains("database is locked") || msg.contains("database table is locked") {
                return RepoError::Conflict(msg.to_string());
            }
        }
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::InsufficientStock(book_id) => AppError::insufficient_stock(book_id),
            RepoError::Conflict(_) => AppError::new(ErrorCode::StockConflict),
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
        }
    }
}
