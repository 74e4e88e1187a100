//! Book Model

use serde::{Deserialize, Serialize};

/// Book catalog status
///
/// `Available` and `OutOfStock` are coupled to the stock level: the
/// inventory ledger flips between them when stock crosses zero.
/// `Discontinued` and `ComingSoon` are set manually and never auto-flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    Available,
    OutOfStock,
    Discontinued,
    ComingSoon,
}

impl Default for BookStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl BookStatus {
    /// Whether a book in this status can be placed in an order
    pub fn is_purchasable(&self) -> bool {
        matches!(self, Self::Available | Self::OutOfStock)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::OutOfStock => "OUT_OF_STOCK",
            Self::Discontinued => "DISCONTINUED",
            Self::ComingSoon => "COMING_SOON",
        }
    }
}

/// Book entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Book {
    pub id: i64,
    /// ISBN-13, unique across the catalog
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    /// Unit price in cents
    pub price_cents: i64,
    /// On-hand stock; mutated only through the inventory ledger
    pub stock_quantity: i64,
    pub status: BookStatus,
    pub category_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create book payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCreate {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub price_cents: i64,
    /// Initial stock, recorded as the book's first ledger entry
    #[serde(default)]
    pub initial_stock: i64,
    pub status: Option<BookStatus>,
    pub category_id: i64,
}

/// Update book payload
///
/// Stock is deliberately absent: all stock changes go through the
/// inventory ledger so the audit trail stays complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookUpdate {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub status: Option<BookStatus>,
    pub category_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&BookStatus::OutOfStock).unwrap(),
            "\"OUT_OF_STOCK\""
        );
        let status: BookStatus = serde_json::from_str("\"COMING_SOON\"").unwrap();
        assert_eq!(status, BookStatus::ComingSoon);
    }

    #[test]
    fn test_purchasable() {
        assert!(BookStatus::Available.is_purchasable());
        assert!(BookStatus::OutOfStock.is_purchasable());
        assert!(!BookStatus::Discontinued.is_purchasable());
        assert!(!BookStatus::ComingSoon.is_purchasable());
    }
}
