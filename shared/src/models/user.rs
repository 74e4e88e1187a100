//! User Model

use serde::{Deserialize, Serialize};

/// User role (RBAC)
///
/// Roles map to fixed permission sets on the server side; there is no
/// per-user permission storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Staff,
    Customer,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Customer
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Customer => "customer",
        }
    }

    /// Parse a role name as stored in JWT claims
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "admin" => Some(Self::Admin),
            "staff" => Some(Self::Staff),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    /// Argon2 password hash, never serialized to clients
    #[serde(skip_serializing)]
    pub hash_pass: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create user payload (registration / seeding)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    pub role: Option<UserRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("staff"), Some(UserRole::Staff));
        assert_eq!(UserRole::parse("customer"), Some(UserRole::Customer));
        assert_eq!(UserRole::parse("manager"), None);
        assert_eq!(UserRole::Staff.as_str(), "staff");
    }

    #[test]
    fn test_hash_not_serialized() {
        let user = User {
            id: 1,
            username: "alice".into(),
            display_name: "Alice".into(),
            hash_pass: "secret-hash".into(),
            role: UserRole::Customer,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
