//! Data models
//!
//! Shared between the server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), all money values are
//! integer cents, all timestamps are UTC milliseconds.

pub mod book;
pub mod cart_item;
pub mod category;
pub mod inventory_log;
pub mod order;
pub mod payment;
pub mod user;

// Re-exports
pub use book::*;
pub use cart_item::*;
pub use category::*;
pub use inventory_log::*;
pub use order::*;
pub use payment::*;
pub use user::*;
