//! Unified error codes for the bookstore backend
//!
//! This module defines all error codes used across the server and frontend.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Cart errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Book and stock errors
//! - 7xxx: Category errors
//! - 8xxx: User errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1005,
    /// Password too short
    PasswordTooShort = 1006,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2002,

    // ==================== 3xxx: Cart ====================
    /// Cart is empty
    CartEmpty = 3001,
    /// Cart item not found
    CartItemNotFound = 3002,
    /// Cart quantity out of the allowed range
    CartQuantityInvalid = 3003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Illegal order status transition
    OrderInvalidTransition = 4002,
    /// Order can no longer be cancelled
    OrderNotCancellable = 4003,
    /// Order was modified concurrently
    OrderConflict = 4004,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Invalid payment method
    PaymentInvalidMethod = 5002,
    /// Illegal payment status transition
    PaymentInvalidTransition = 5003,

    // ==================== 6xxx: Book / Stock ====================
    /// Book not found
    BookNotFound = 6001,
    /// Book ISBN already exists
    BookIsbnExists = 6002,
    /// Book is not available for purchase
    BookUnavailable = 6003,
    /// Not enough stock to satisfy the request
    InsufficientStock = 6101,
    /// Adjustment would drive stock below zero
    NegativeStock = 6102,
    /// Lost a concurrent stock update race
    StockConflict = 6103,

    // ==================== 7xxx: Category ====================
    /// Category not found
    CategoryNotFound = 7001,
    /// Category name already exists
    CategoryNameExists = 7002,
    /// Category has books
    CategoryHasBooks = 7003,

    // ==================== 8xxx: User ====================
    /// User not found
    UserNotFound = 8001,
    /// Username already exists
    UsernameExists = 8002,
    /// Unknown role name
    RoleInvalid = 8003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timeout
    TimeoutError = 9003,
    /// Configuration error
    ConfigError = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Cart
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::CartItemNotFound => "Cart item not found",
            ErrorCode::CartQuantityInvalid => "Cart quantity must be between 1 and 100",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderInvalidTransition => "Illegal order status transition",
            ErrorCode::OrderNotCancellable => "Order can no longer be cancelled",
            ErrorCode::OrderConflict => "Order was modified concurrently",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::PaymentInvalidTransition => "Illegal payment status transition",

            // Book / Stock
            ErrorCode::BookNotFound => "Book not found",
            ErrorCode::BookIsbnExists => "Book ISBN already exists",
            ErrorCode::BookUnavailable => "Book is not available for purchase",
            ErrorCode::InsufficientStock => "Not enough stock to satisfy the request",
            ErrorCode::NegativeStock => "Stock quantity cannot become negative",
            ErrorCode::StockConflict => "Lost a concurrent stock update, please retry",

            // Category
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryNameExists => "Category name already exists",
            ErrorCode::CategoryHasBooks => "Category has associated books",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UsernameExists => "Username already exists",
            ErrorCode::RoleInvalid => "Unknown role name",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::AccountDisabled),
            1006 => Ok(ErrorCode::PasswordTooShort),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::AdminRequired),

            // Cart
            3001 => Ok(ErrorCode::CartEmpty),
            3002 => Ok(ErrorCode::CartItemNotFound),
            3003 => Ok(ErrorCode::CartQuantityInvalid),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderInvalidTransition),
            4003 => Ok(ErrorCode::OrderNotCancellable),
            4004 => Ok(ErrorCode::OrderConflict),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::PaymentInvalidMethod),
            5003 => Ok(ErrorCode::PaymentInvalidTransition),

            // Book / Stock
            6001 => Ok(ErrorCode::BookNotFound),
            6002 => Ok(ErrorCode::BookIsbnExists),
            6003 => Ok(ErrorCode::BookUnavailable),
            6101 => Ok(ErrorCode::InsufficientStock),
            6102 => Ok(ErrorCode::NegativeStock),
            6103 => Ok(ErrorCode::StockConflict),

            // Category
            7001 => Ok(ErrorCode::CategoryNotFound),
            7002 => Ok(ErrorCode::CategoryNameExists),
            7003 => Ok(ErrorCode::CategoryHasBooks),

            // User
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::UsernameExists),
            8003 => Ok(ErrorCode::RoleInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::TimeoutError),
            9004 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        // General
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);

        // Auth / Permission
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);

        // Domain bands
        assert_eq!(ErrorCode::CartEmpty.code(), 3001);
        assert_eq!(ErrorCode::OrderInvalidTransition.code(), 4002);
        assert_eq!(ErrorCode::PaymentInvalidMethod.code(), 5002);
        assert_eq!(ErrorCode::InsufficientStock.code(), 6101);
        assert_eq!(ErrorCode::CategoryNotFound.code(), 7001);
        assert_eq!(ErrorCode::UsernameExists.code(), 8002);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::InsufficientStock.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(3001), Ok(ErrorCode::CartEmpty));
        assert_eq!(ErrorCode::try_from(6101), Ok(ErrorCode::InsufficientStock));
        assert_eq!(ErrorCode::try_from(9001), Ok(ErrorCode::InternalError));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_from_error_code_to_u16() {
        let code: u16 = ErrorCode::InsufficientStock.into();
        assert_eq!(code, 6101);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::CartEmpty).unwrap();
        assert_eq!(json, "3001");

        let code: ErrorCode = serde_json::from_str("6101").unwrap();
        assert_eq!(code, ErrorCode::InsufficientStock);
    }
}
