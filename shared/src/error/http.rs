//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::CartItemNotFound
            | Self::OrderNotFound
            | Self::PaymentNotFound
            | Self::BookNotFound
            | Self::CategoryNotFound
            | Self::UserNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::OrderConflict
            | Self::StockConflict
            | Self::BookIsbnExists
            | Self::CategoryNameExists
            | Self::CategoryHasBooks
            | Self::UsernameExists => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::AdminRequired => StatusCode::FORBIDDEN,

            // 422 Unprocessable Entity (business rules)
            Self::CartEmpty
            | Self::OrderInvalidTransition
            | Self::OrderNotCancellable
            | Self::PaymentInvalidTransition
            | Self::BookUnavailable
            | Self::InsufficientStock
            | Self::NegativeStock => StatusCode::UNPROCESSABLE_ENTITY,

            // 400 Bad Request
            Self::Unknown
            | Self::ValidationFailed
            | Self::InvalidRequest
            | Self::InvalidFormat
            | Self::RequiredField
            | Self::ValueOutOfRange
            | Self::PasswordTooShort
            | Self::CartQuantityInvalid
            | Self::PaymentInvalidMethod
            | Self::RoleInvalid => StatusCode::BAD_REQUEST,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 504 Gateway Timeout
            Self::TimeoutError => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
        assert_eq!(ErrorCode::BookNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::PermissionDenied.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::InsufficientStock.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ErrorCode::StockConflict.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
