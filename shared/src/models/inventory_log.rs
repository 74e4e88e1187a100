//! Inventory Log Model
//!
//! Append-only ledger of every stock mutation. Rows are never updated or
//! deleted; the current stock of a book always equals the sum of its
//! `quantity_change` entries.

use serde::{Deserialize, Serialize};

/// Attributable reason for a stock change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryReason {
    InitialStock,
    OrderPlaced,
    OrderCancelled,
    ManualAdjustment,
}

impl InventoryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitialStock => "INITIAL_STOCK",
            Self::OrderPlaced => "ORDER_PLACED",
            Self::OrderCancelled => "ORDER_CANCELLED",
            Self::ManualAdjustment => "MANUAL_ADJUSTMENT",
        }
    }
}

/// Inventory ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryLog {
    pub id: i64,
    pub book_id: i64,
    /// The actor the change is attributed to
    pub user_id: i64,
    /// Signed delta applied to the book's stock
    pub quantity_change: i64,
    /// Stock level after the change was applied
    pub quantity_after: i64,
    pub reason: InventoryReason,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// Manual stock adjustment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjust {
    pub book_id: i64,
    pub quantity_change: i64,
    pub notes: Option<String>,
}
