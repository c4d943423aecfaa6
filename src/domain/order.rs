//! Order aggregate: status state machine, customer snapshot, line items.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{OrderId, ProductId};

/// Order lifecycle status.
///
/// Transitions are forward-only:
///
/// ```text
/// Pending        -> Approved | Rejected
/// Approved       -> Shipped
/// Shipped        -> OutForDelivery | Delivered
/// OutForDelivery -> Delivered
/// ```
///
/// `Rejected` and `Delivered` are terminal. `OutForDelivery` is an
/// optional hop: a shipped order may be marked delivered directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed by the customer, awaiting an admin decision.
    Pending,
    /// Accepted by an admin; stock was already reserved at placement.
    Approved,
    /// Declined by an admin. Terminal.
    Rejected,
    /// Handed to the shipping provider.
    Shipped,
    /// On the last-mile vehicle.
    OutForDelivery,
    /// Received by the customer. Terminal.
    Delivered,
}

impl OrderStatus {
    /// Returns `true` if `next` is a legal transition from `self`.
    ///
    /// Setting the current status again is never legal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Shipped)
                | (Self::Shipped, Self::OutForDelivery)
                | (Self::Shipped, Self::Delivered)
                | (Self::OutForDelivery, Self::Delivered)
        )
    }

    /// Returns `true` for statuses with no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Delivered)
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "shipped" => Ok(Self::Shipped),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Shipped => "shipped",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
        };
        write!(f, "{s}")
    }
}

/// Shipping and contact snapshot captured at order time.
///
/// Deliberately denormalized: later profile edits never affect past
/// orders.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerInfo {
    /// Full name.
    pub name: String,
    /// Contact email; also the notification recipient.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
}

/// One order line: a name/price snapshot decoupled from the live
/// product record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    /// Product the line refers to.
    pub product_id: ProductId,
    /// Product name at order time.
    pub name: String,
    /// Unit price at order time.
    pub price: f64,
    /// Quantity ordered.
    pub quantity: u32,
    /// Product category at order time.
    pub category: String,
}

/// Shipping details populated on the transition to `Shipped`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShippingInfo {
    /// Carrier tracking identifier.
    pub tracking_id: String,
    /// Carrier name.
    pub provider: String,
    /// Shipping method (e.g. `"express"`).
    pub shipping_method: String,
    /// Estimated delivery date, when the carrier provides one.
    pub estimated_delivery: Option<DateTime<Utc>>,
    /// Instant the order was handed to the carrier.
    pub shipped_at: DateTime<Utc>,
}

/// A customer order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    /// Unique identifier, assigned at placement.
    pub id: OrderId,
    /// Customer snapshot at order time.
    pub customer: CustomerInfo,
    /// Line items with price/name snapshots.
    pub items: Vec<OrderItem>,
    /// Order total. Verified server-side against the line items.
    pub subtotal: f64,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Placement timestamp, immutable.
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when the order is approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// Set exactly once, when the order is delivered.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Free-text notes set on the approve/reject decision.
    pub admin_notes: Option<String>,
    /// Free-text notes set on delivery.
    pub delivery_notes: Option<String>,
    /// Shipping details, populated on the transition to `Shipped`.
    pub shipping: Option<ShippingInfo>,
}

impl Order {
    /// Creates a new `Pending` order with a fresh ID.
    #[must_use]
    pub fn new(customer: CustomerInfo, items: Vec<OrderItem>, subtotal: f64) -> Self {
        Self {
            id: OrderId::new(),
            customer,
            items,
            subtotal,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            approved_at: None,
            delivered_at: None,
            admin_notes: None,
            delivery_notes: None,
            shipping: None,
        }
    }

    /// Recomputes the subtotal from the line-item snapshots.
    #[must_use]
    pub fn computed_subtotal(items: &[OrderItem]) -> f64 {
        items
            .iter()
            .map(|item| item.price * f64::from(item.quantity))
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn item(price: f64, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(),
            name: "Ring A".into(),
            price,
            quantity,
            category: "rings".into(),
        }
    }

    #[test]
    fn pending_can_be_decided() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Approved));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Rejected));
    }

    #[test]
    fn pending_cannot_skip_to_shipped() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn same_status_is_not_a_transition() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Approved,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn terminal_states_are_frozen() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Approved,
            OrderStatus::Shipped,
            OrderStatus::OutForDelivery,
        ] {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Rejected.can_transition_to(next));
        }
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn out_for_delivery_is_optional() {
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::OutForDelivery));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::OutForDelivery.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).ok();
        assert_eq!(json.as_deref(), Some("\"out_for_delivery\""));
    }

    #[test]
    fn computed_subtotal_sums_lines() {
        let items = vec![item(100.0, 3), item(25.5, 2)];
        let total = Order::computed_subtotal(&items);
        assert!((total - 351.0).abs() < f64::EPSILON);
    }

    #[test]
    fn new_order_is_pending() {
        let customer = CustomerInfo {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: "+1".into(),
            address: "1 Main St".into(),
            city: "Metropolis".into(),
            postal_code: "00001".into(),
            country: "US".into(),
        };
        let order = Order::new(customer, vec![item(100.0, 1)], 100.0);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.approved_at.is_none());
        assert!(order.shipping.is_none());
    }
}
