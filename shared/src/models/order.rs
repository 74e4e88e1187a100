//! Order Model
//!
//! Orders are immutable after creation except for `status` and the
//! shipping/delivery timestamps. The status state machine is a closed
//! transition table; anything not listed here is an illegal transition.

use super::payment::{Payment, PaymentMethod};
use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// ```text
/// Pending → Processing → Packed → Shipped → Delivered
///    │           │
///    └───────────┴────→ Cancelled
/// ```
///
/// `Delivered` and `Cancelled` are terminal. Cancellation is only legal
/// before packing starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Packed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Packed => "PACKED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse a status name as it appears on the wire
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "PACKED" => Some(Self::Packed),
            "SHIPPED" => Some(Self::Shipped),
            "DELIVERED" => Some(Self::Delivered),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether this status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether an order in this status may still be cancelled
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// The explicit transition table
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Packed)
                | (Self::Packed, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (Self::Pending, Self::Cancelled)
                | (Self::Processing, Self::Cancelled)
        )
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Human-readable unique order number (ORD-YYYYMMDD-NNNN)
    pub order_no: String,
    pub user_id: i64,
    pub status: OrderStatus,
    /// Sum of line items at order time, in cents
    pub total_cents: i64,
    pub shipping_address: String,
    pub shipping_phone: String,
    pub note: Option<String>,
    pub ordered_at: i64,
    pub shipped_at: Option<i64>,
    pub delivered_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item — snapshot taken at checkout
///
/// `price_cents` and `title` are captured at order time and never
/// recomputed from the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub book_id: i64,
    pub title: String,
    pub quantity: i64,
    pub price_cents: i64,
}

/// Checkout payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub shipping_address: String,
    pub shipping_phone: String,
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
}

/// Staff status-update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Order with its items and payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Packed));
        assert!(OrderStatus::Packed.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_cancellation_window() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Packed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));

        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(!OrderStatus::Packed.is_cancellable());
    }

    #[test]
    fn test_no_skipping_or_backward_transitions() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Packed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());

        for next in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Packed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        let status: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }
}
