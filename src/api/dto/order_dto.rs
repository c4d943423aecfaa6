//! Order DTOs for placement, public lookup, and admin transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{CustomerInfo, Order, OrderId, OrderItem, OrderStatus, ShippingInfo};
use crate::service::{Decision, OrderStats, TransitionOutcome};

/// Request body for `POST /orders`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    /// Customer contact and shipping address.
    pub customer: CustomerInfo,
    /// Order line items.
    pub items: Vec<OrderItem>,
    /// Client-computed subtotal, verified server-side.
    pub subtotal: f64,
}

/// Response body for `POST /orders` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPlacedResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// Identifier of the new order.
    pub order_id: OrderId,
    /// Initial status (`pending`).
    pub status: OrderStatus,
    /// Server creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Server-accepted subtotal.
    pub subtotal: f64,
    /// Whether the confirmation email went out.
    pub email_sent: bool,
    /// Channel error when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

impl From<TransitionOutcome> for OrderPlacedResponse {
    fn from(outcome: TransitionOutcome) -> Self {
        Self {
            success: true,
            order_id: outcome.order.id,
            status: outcome.order.status,
            created_at: outcome.order.created_at,
            subtotal: outcome.order.subtotal,
            email_sent: outcome.email_sent,
            email_error: outcome.email_error,
        }
    }
}

/// Customer-facing order view. Contact details beyond the name are
/// withheld so an order identifier alone cannot leak an address.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicOrderDto {
    /// Order identifier.
    pub id: OrderId,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Customer display name.
    pub customer_name: String,
    /// Line items.
    pub items: Vec<OrderItem>,
    /// Order subtotal.
    pub subtotal: f64,
    /// Placement timestamp.
    pub created_at: DateTime<Utc>,
    /// Tracking details once shipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingInfo>,
    /// Delivery timestamp once delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl From<Order> for PublicOrderDto {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            status: order.status,
            customer_name: order.customer.name,
            items: order.items,
            subtotal: order.subtotal,
            created_at: order.created_at,
            shipping: order.shipping,
            delivered_at: order.delivered_at,
        }
    }
}

/// Query parameters for `GET /orders`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderLookupParams {
    /// Customer email to look up orders for.
    pub email: String,
}

/// Response body for `GET /orders`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicOrderListResponse {
    /// Sanitized orders, newest first.
    pub orders: Vec<PublicOrderDto>,
    /// Number of orders returned.
    pub total: usize,
}

/// Request body for `POST /admin/orders/{id}/decision`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DecisionRequest {
    /// Approve or reject.
    pub action: Decision,
    /// Free-form note; included in the rejection email when rejecting.
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// Request body for `POST /admin/orders/{id}/deliver`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeliveryRequest {
    /// Optional delivery note stored on the order.
    #[serde(default)]
    pub delivery_notes: Option<String>,
}

/// Response body for lifecycle transitions that notify the customer.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// The order after the transition.
    pub order: Order,
    /// Whether the notification email went out.
    pub email_sent: bool,
    /// Channel error when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

impl From<TransitionOutcome> for TransitionResponse {
    fn from(outcome: TransitionOutcome) -> Self {
        Self {
            success: true,
            order: outcome.order,
            email_sent: outcome.email_sent,
            email_error: outcome.email_error,
        }
    }
}

/// Response body for transitions with no notification attached.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// The order after the mutation.
    pub order: Order,
}

/// Response body for `GET /admin/orders`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminOrderListResponse {
    /// All orders, newest first.
    pub orders: Vec<Order>,
    /// Dashboard counters and revenue.
    pub stats: OrderStats,
}
