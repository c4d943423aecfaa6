//! Plain-text message bodies for order lifecycle notifications.
//!
//! The rejection body is deliberately not here: the lifecycle service
//! interpolates the admin's free-text notes at the call site.

use super::EmailMessage;
use crate::domain::Order;

/// Confirmation sent right after an order is placed.
#[must_use]
pub fn order_confirmation(order: &Order) -> EmailMessage {
    let lines: String = order
        .items
        .iter()
        .map(|item| format!("  {} x{} — {:.2}\n", item.name, item.quantity, item.price))
        .collect();

    EmailMessage {
        to: order.customer.email.clone(),
        subject: format!("We received your order {}", order.id),
        body: format!(
            "Hi {},\n\nThanks for your order!\n\n{lines}\nTotal: {:.2}\n\n\
             We'll let you know as soon as it is confirmed.\n",
            order.customer.name, order.subtotal
        ),
    }
}

/// Sent when an admin approves the order.
#[must_use]
pub fn order_approved(order: &Order) -> EmailMessage {
    EmailMessage {
        to: order.customer.email.clone(),
        subject: format!("Your order {} is confirmed", order.id),
        body: format!(
            "Hi {},\n\nGood news — your order has been confirmed and is being\n\
             prepared for shipment.\n",
            order.customer.name
        ),
    }
}

/// Sent when the order is handed to the carrier.
#[must_use]
pub fn order_shipped(order: &Order) -> EmailMessage {
    let tracking = order.shipping.as_ref().map_or_else(String::new, |s| {
        format!("Carrier: {}\nTracking: {}\n", s.provider, s.tracking_id)
    });

    EmailMessage {
        to: order.customer.email.clone(),
        subject: format!("Your order {} has shipped", order.id),
        body: format!(
            "Hi {},\n\nYour order is on its way.\n{tracking}",
            order.customer.name
        ),
    }
}

/// Sent when the order is marked delivered.
#[must_use]
pub fn order_delivered(order: &Order) -> EmailMessage {
    EmailMessage {
        to: order.customer.email.clone(),
        subject: format!("Your order {} was delivered", order.id),
        body: format!(
            "Hi {},\n\nYour order has been delivered. We hope you love it!\n",
            order.customer.name
        ),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{CustomerInfo, OrderItem, ProductId};

    fn order() -> Order {
        Order::new(
            CustomerInfo {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                phone: "+1".into(),
                address: "1 Main St".into(),
                city: "Metropolis".into(),
                postal_code: "00001".into(),
                country: "US".into(),
            },
            vec![OrderItem {
                product_id: ProductId::new(),
                name: "Ring A".into(),
                price: 100.0,
                quantity: 2,
                category: "rings".into(),
            }],
            200.0,
        )
    }

    #[test]
    fn confirmation_addresses_the_customer() {
        let msg = order_confirmation(&order());
        assert_eq!(msg.to, "ada@example.com");
        assert!(msg.body.contains("Ring A x2"));
        assert!(msg.body.contains("200.00"));
    }

    #[test]
    fn shipped_includes_tracking_when_present() {
        let mut o = order();
        o.shipping = Some(crate::domain::ShippingInfo {
            tracking_id: "TRK-1".into(),
            provider: "DHL".into(),
            shipping_method: "express".into(),
            estimated_delivery: None,
            shipped_at: chrono::Utc::now(),
        });
        let msg = order_shipped(&o);
        assert!(msg.body.contains("TRK-1"));
        assert!(msg.body.contains("DHL"));
    }
}
