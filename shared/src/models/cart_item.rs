//! Cart Item Model

use super::book::BookStatus;
use serde::{Deserialize, Serialize};

/// Allowed quantity range for a single cart line
pub const MIN_CART_QUANTITY: i64 = 1;
pub const MAX_CART_QUANTITY: i64 = 100;

/// Cart item entity — one (user, book) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub quantity: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Add-to-cart payload
///
/// Adding a book already in the cart replaces the line's quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemAdd {
    pub book_id: i64,
    pub quantity: i64,
}

/// Update-quantity payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemUpdate {
    pub quantity: i64,
}

/// Cart line joined with live book data
///
/// Used both for displaying the cart and as the input of cart-to-order
/// conversion, so checkout always sees current stock and price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartLine {
    pub book_id: i64,
    pub title: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub book_status: BookStatus,
    pub quantity: i64,
}

impl CartLine {
    /// Line total at the current catalog price
    pub fn line_total_cents(&self) -> i64 {
        self.price_cents * self.quantity
    }
}
