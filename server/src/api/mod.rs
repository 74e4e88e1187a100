//! API route modules
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`auth`] - login, registration, current user
//! - [`categories`] - category management
//! - [`books`] - catalog browsing and management
//! - [`cart`] - per-user shopping cart
//! - [`orders`] - checkout, order lifecycle, payments
//! - [`inventory`] - stock adjustments, ledger, low-stock report
//!
//! Each module exposes a `router()` merged in
//! [`crate::core::server::build_app`].

pub mod auth;
pub mod books;
pub mod cart;
pub mod categories;
pub mod health;
pub mod inventory;
pub mod orders;

// Re-export common types for handlers
pub use crate::utils::{AppResult, ApiResponse};
