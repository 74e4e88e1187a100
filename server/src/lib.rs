//! Bookstore Server - multi-role e-commerce bookstore backend
//!
//! # Architecture overview
//!
//! - **Database** (`db`): embedded SQLite via sqlx, repository modules
//! - **Auth** (`auth`): JWT + Argon2, RBAC permission table
//! - **Order workflow** (`orders`): cart-to-order conversion, status
//!   state machine, transactional stock movements
//! - **HTTP API** (`api`): RESTful routes per resource
//!
//! # Module structure
//!
//! ```text
//! server/src/
//! ├── core/      # config, state, HTTP server
//! ├── auth/      # JWT, passwords, permissions, middleware
//! ├── db/        # pool, migrations, repositories
//! ├── orders/    # order workflow engine
//! ├── api/       # HTTP routes and handlers
//! └── utils/     # logging, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Load .env and initialize logging
///
/// Must run before anything emits tracing events.
pub fn setup_environment() -> anyhow::Result<()> {
    // .env is optional; real deployments set the environment directly
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    let log_dir = config.log_dir();
    utils::logger::init_logger_with_file(
        &config.log_level,
        config.is_production(),
        log_dir.to_str(),
    )?;
    Ok(())
}

/// Startup banner (logged, not printed)
pub fn print_banner() {
    tracing::info!("==============================================");
    tracing::info!("  BOOKSTORE SERVER v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("==============================================");
}
