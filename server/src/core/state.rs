use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;

/// Server state - shared handle to every service
///
/// Cloning is cheap: the pool is internally reference-counted and the JWT
/// service sits behind an `Arc`.
#[derive(Clone, Debug)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// SQLite connection pool
    pub pool: SqlitePool,
    /// JWT token service
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    pub fn new(config: Config, pool: SqlitePool, jwt_service: Arc<JwtService>) -> Self {
        Self {
            config,
            pool,
            jwt_service,
        }
    }

    /// Initialize the server state
    ///
    /// 1. Ensure the working directory structure exists
    /// 2. Open the database (work_dir/database/bookstore.db) and run migrations
    /// 3. Seed the default admin account if the user table is empty
    ///
    /// # Panics
    ///
    /// Panics when the database cannot be opened — the server is useless
    /// without it.
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("bookstore.db");
        let db_path_str = db_path.to_string_lossy();

        let db_service = DbService::new(&db_path_str)
            .await
            .expect("Failed to initialize database");
        let pool = db_service.pool;

        if let Err(e) = crate::db::seed_default_admin(&pool).await {
            tracing::error!(error = %e, "Failed to seed default admin account");
        }

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self::new(config.clone(), pool, jwt_service)
    }

    /// Get the JWT service
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
