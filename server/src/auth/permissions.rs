//! Permission Definitions
//!
//! Simplified RBAC permission system.
//!
//! Design principles:
//! - Browsing the catalog needs no account; shopping (cart/checkout) only
//!   needs a login
//! - Staff permissions are modular, one per back-office area
//! - Roles map to fixed permission sets; there is no per-user grant storage

use shared::models::UserRole;

/// All grantable staff permissions
pub const ALL_PERMISSIONS: &[&str] = &[
    "catalog:manage",   // books and categories CRUD
    "inventory:manage", // stock adjustments, ledger, low-stock report
    "orders:manage",    // order status transitions, all-orders listing
    "payments:manage",  // payment status updates
];

/// Admin-only pseudo permission
pub const ADMIN_ONLY_PERMISSIONS: &[&str] = &[
    "all", // superuser
];

/// Default role permissions
pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &["all"];

/// Staff get every modular permission
pub const DEFAULT_STAFF_PERMISSIONS: &[&str] = &[
    "catalog:manage",
    "inventory:manage",
    "orders:manage",
    "payments:manage",
];

/// Customers act only on their own cart and orders
pub const DEFAULT_CUSTOMER_PERMISSIONS: &[&str] = &[];

/// Get the permission set for a role
pub fn get_default_permissions(role: UserRole) -> Vec<String> {
    let perms: &[&str] = match role {
        UserRole::Admin => DEFAULT_ADMIN_PERMISSIONS,
        UserRole::Staff => DEFAULT_STAFF_PERMISSIONS,
        UserRole::Customer => DEFAULT_CUSTOMER_PERMISSIONS,
    };
    perms.iter().map(|s| s.to_string()).collect()
}

/// Validate a permission string
pub fn is_valid_permission(permission: &str) -> bool {
    ALL_PERMISSIONS.contains(&permission)
        || ADMIN_ONLY_PERMISSIONS.contains(&permission)
        || permission.ends_with(":*")
}

// ── Capability check ────────────────────────────────────────────────

use crate::auth::CurrentUser;
use crate::utils::{AppError, AppResult};

/// Operations the workflow engine and handlers gate on
///
/// The single place that maps operations to required permissions, so the
/// check is not re-implemented per handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Place an order from the caller's own cart
    PlaceOrder,
    /// Cancel the caller's own order
    CancelOwnOrder,
    /// Transition any order's status
    UpdateOrderStatus,
    /// List every order / read any order
    ViewAllOrders,
    /// Manual stock adjustment and ledger access
    AdjustStock,
    /// Update payment records
    UpdatePayment,
    /// Create/update/delete books and categories
    ManageCatalog,
}

impl Operation {
    /// The permission this operation requires, or `None` when a login is
    /// enough (ownership is checked by the operation itself)
    pub fn required_permission(&self) -> Option<&'static str> {
        match self {
            Self::PlaceOrder | Self::CancelOwnOrder => None,
            Self::UpdateOrderStatus | Self::ViewAllOrders => Some("orders:manage"),
            Self::AdjustStock => Some("inventory:manage"),
            Self::UpdatePayment => Some("payments:manage"),
            Self::ManageCatalog => Some("catalog:manage"),
        }
    }
}

/// Check that `user` may perform `op`
pub fn authorize(user: &CurrentUser, op: Operation) -> AppResult<()> {
    if let Some(permission) = op.required_permission()
        && !user.has_permission(permission)
    {
        crate::security_log!(
            WARN,
            "permission_denied",
            user_id = user.id,
            username = user.username.clone(),
            required_permission = permission
        );
        return Err(AppError::forbidden(format!(
            "Permission denied: {}",
            permission
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(role: &str, permissions: &[&str]) -> CurrentUser {
        CurrentUser {
            id: 1,
            username: "test".into(),
            display_name: "Test".into(),
            role: role.into(),
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_permissions() {
        assert_eq!(get_default_permissions(UserRole::Admin), vec!["all"]);
        assert_eq!(
            get_default_permissions(UserRole::Staff),
            vec![
                "catalog:manage",
                "inventory:manage",
                "orders:manage",
                "payments:manage"
            ]
        );
        assert!(get_default_permissions(UserRole::Customer).is_empty());
    }

    #[test]
    fn test_authorize_customer() {
        let customer = user_with("customer", &[]);
        assert!(authorize(&customer, Operation::PlaceOrder).is_ok());
        assert!(authorize(&customer, Operation::CancelOwnOrder).is_ok());
        assert!(authorize(&customer, Operation::UpdateOrderStatus).is_err());
        assert!(authorize(&customer, Operation::AdjustStock).is_err());
        assert!(authorize(&customer, Operation::ManageCatalog).is_err());
    }

    #[test]
    fn test_authorize_staff_and_admin() {
        let staff = user_with("staff", DEFAULT_STAFF_PERMISSIONS);
        assert!(authorize(&staff, Operation::UpdateOrderStatus).is_ok());
        assert!(authorize(&staff, Operation::AdjustStock).is_ok());
        assert!(authorize(&staff, Operation::UpdatePayment).is_ok());

        let admin = user_with("admin", &[]);
        assert!(authorize(&admin, Operation::UpdateOrderStatus).is_ok());
        assert!(authorize(&admin, Operation::ManageCatalog).is_ok());
    }

    #[test]
    fn test_is_valid_permission() {
        assert!(is_valid_permission("catalog:manage"));
        assert!(is_valid_permission("all"));
        assert!(is_valid_permission("orders:*"));
        assert!(!is_valid_permission("something:else"));
    }
}
