//! Authentication and authorization
//!
//! JWT token service, argon2 password hashing, RBAC permission table and
//! the axum middleware that ties them together.

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permissions;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::require_auth;
pub use permissions::{Operation, authorize, get_default_permissions};
