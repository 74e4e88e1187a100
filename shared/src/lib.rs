//! Shared types for the bookstore backend
//!
//! Common types used across crates: data models, the unified error
//! system, client-facing DTOs and small utilities.

pub mod client;
pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
