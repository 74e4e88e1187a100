//! Database Module
//!
//! Handles the SQLite connection pool and migrations

pub mod repository;

use crate::utils::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;

/// Database service — owns a SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Create a new database service with WAL mode
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        // Build connection options: WAL, foreign keys, normal sync
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON")
            // Wait up to 5s on write contention instead of failing; losers
            // past the timeout surface as a retryable Conflict
            .busy_timeout(std::time::Duration::from_secs(5))
            .optimize_on_close(true, None);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        tracing::info!("Database connection established (SQLite WAL, busy_timeout=5000ms)");

        sqlx::migrate!("./migrations")
            .set_ignore_missing(true)
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }
}

/// Seed the default admin account when the user table is empty
///
/// Password comes from `DEFAULT_ADMIN_PASSWORD`; the fallback is flagged
/// loudly so it never survives into production unnoticed.
pub async fn seed_default_admin(pool: &SqlitePool) -> Result<(), AppError> {
    use shared::models::{UserCreate, UserRole};

    if repository::user::count(pool).await.map_err(AppError::from)? > 0 {
        return Ok(());
    }

    let password =
        std::env::var("DEFAULT_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    if password == "admin123" {
        tracing::warn!("Seeding default admin with the fallback password — change it!");
    }

    let admin = repository::user::create(
        pool,
        UserCreate {
            username: "admin".to_string(),
            password,
            display_name: Some("Administrator".to_string()),
            role: Some(UserRole::Admin),
        },
    )
    .await
    .map_err(AppError::from)?;

    tracing::info!(user_id = admin.id, "Default admin account created");
    Ok(())
}
