//! Order service: placement with inventory reservation and the
//! lifecycle state machine.
//!
//! Every mutation follows the pattern: validate → persist → advisory
//! notification → result. The status change is the source of truth; a
//! notification failure is logged and reported in the outcome, never
//! rolled back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{CustomerInfo, Order, OrderId, OrderItem, OrderStatus, ShippingInfo};
use crate::error::{ApiError, StockShortage};
use crate::notify::{EmailMessage, Notifier, messages};
use crate::persistence::{OrderStore, ProductStore};

/// Largest tolerated gap between the client subtotal and the
/// server-side recomputation.
const SUBTOTAL_TOLERANCE: f64 = 0.01;

/// Admin decision on a pending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Accept the order.
    Approved,
    /// Decline the order.
    Rejected,
}

/// Shipping fields supplied on the transition to `Shipped`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ShipmentDetails {
    /// Carrier tracking identifier.
    pub tracking_id: String,
    /// Carrier name.
    pub provider: String,
    /// Shipping method (e.g. `"express"`).
    pub shipping_method: String,
    /// Estimated delivery date, if known.
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Result of a lifecycle mutation: the updated order plus the advisory
/// notification outcome.
#[derive(Debug)]
pub struct TransitionOutcome {
    /// The order after the mutation.
    pub order: Order,
    /// Whether the notification went out.
    pub email_sent: bool,
    /// Channel error when it did not.
    pub email_error: Option<String>,
}

/// Per-status counts and revenue for the admin dashboard.
#[derive(Debug, Default, serde::Serialize, ToSchema)]
pub struct OrderStats {
    /// Total number of orders.
    pub total: usize,
    /// Orders awaiting a decision.
    pub pending: usize,
    /// Approved orders.
    pub approved: usize,
    /// Rejected orders.
    pub rejected: usize,
    /// Shipped orders.
    pub shipped: usize,
    /// Orders out for delivery.
    pub out_for_delivery: usize,
    /// Delivered orders.
    pub delivered: usize,
    /// Sum of subtotals over non-rejected orders.
    pub revenue: f64,
}

/// Orchestration layer for order placement and lifecycle transitions.
#[derive(Debug)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    notifier: Arc<dyn Notifier>,
}

impl OrderService {
    /// Creates a new `OrderService`.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            orders,
            products,
            notifier,
        }
    }

    /// Places a new order: validates the payload, reserves stock for
    /// every line item, persists the `Pending` record, and sends the
    /// confirmation email (advisory).
    ///
    /// All-or-nothing: if any item fails validation or the stock check,
    /// no stock is decremented and no order record is created.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Validation`] listing every failing field.
    /// - [`ApiError::InsufficientStock`] with one entry per short item.
    /// - [`ApiError::Persistence`] on storage failure.
    pub async fn place_order(
        &self,
        customer: CustomerInfo,
        items: Vec<OrderItem>,
        subtotal: f64,
    ) -> Result<TransitionOutcome, ApiError> {
        validate_placement(&customer, &items, subtotal)?;
        self.check_stock(&items).await?;
        self.reserve_stock(&items).await?;

        let order = Order::new(customer, items, subtotal);
        if let Err(e) = self.orders.create(&order).await {
            // Undo the reservation so a failed write does not strand stock.
            self.release_stock(&order.items).await;
            return Err(e);
        }

        tracing::info!(order_id = %order.id, subtotal, "order placed");
        let (email_sent, email_error) = self.notify(messages::order_confirmation(&order)).await;
        Ok(TransitionOutcome {
            order,
            email_sent,
            email_error,
        })
    }

    /// Approves or rejects a pending order.
    ///
    /// Approval stamps `approved_at`; both branches store the optional
    /// admin notes. The rejection email interpolates those notes.
    ///
    /// # Errors
    ///
    /// - [`ApiError::OrderNotFound`] when the order does not exist.
    /// - [`ApiError::InvalidTransition`] when the order is not pending.
    pub async fn decide(
        &self,
        id: OrderId,
        decision: Decision,
        admin_notes: Option<String>,
    ) -> Result<TransitionOutcome, ApiError> {
        let mut order = self.load(id).await?;
        let target = match decision {
            Decision::Approved => OrderStatus::Approved,
            Decision::Rejected => OrderStatus::Rejected,
        };
        ensure_transition(&order, target)?;

        order.status = target;
        if decision == Decision::Approved {
            order.approved_at = Some(Utc::now());
        }
        if admin_notes.is_some() {
            order.admin_notes = admin_notes;
        }
        self.store(&order).await?;
        tracing::info!(order_id = %id, status = %order.status, "order decided");

        let message = match decision {
            Decision::Approved => messages::order_approved(&order),
            Decision::Rejected => rejection_message(&order),
        };
        let (email_sent, email_error) = self.notify(message).await;
        Ok(TransitionOutcome {
            order,
            email_sent,
            email_error,
        })
    }

    /// Marks an approved order as shipped and stores the shipping block.
    ///
    /// # Errors
    ///
    /// - [`ApiError::OrderNotFound`] when the order does not exist.
    /// - [`ApiError::InvalidTransition`] unless the order is approved.
    pub async fn ship(
        &self,
        id: OrderId,
        details: ShipmentDetails,
    ) -> Result<TransitionOutcome, ApiError> {
        let mut order = self.load(id).await?;
        ensure_transition(&order, OrderStatus::Shipped)?;

        order.status = OrderStatus::Shipped;
        order.shipping = Some(ShippingInfo {
            tracking_id: details.tracking_id,
            provider: details.provider,
            shipping_method: details.shipping_method,
            estimated_delivery: details.estimated_delivery,
            shipped_at: Utc::now(),
        });
        self.store(&order).await?;
        tracing::info!(order_id = %id, "order shipped");

        let (email_sent, email_error) = self.notify(messages::order_shipped(&order)).await;
        Ok(TransitionOutcome {
            order,
            email_sent,
            email_error,
        })
    }

    /// Advances a shipped order to `OutForDelivery`. No notification is
    /// attached to this intermediate hop.
    ///
    /// # Errors
    ///
    /// - [`ApiError::OrderNotFound`] when the order does not exist.
    /// - [`ApiError::InvalidTransition`] unless the order is shipped.
    pub async fn mark_out_for_delivery(&self, id: OrderId) -> Result<Order, ApiError> {
        let mut order = self.load(id).await?;
        ensure_transition(&order, OrderStatus::OutForDelivery)?;

        order.status = OrderStatus::OutForDelivery;
        self.store(&order).await?;
        tracing::info!(order_id = %id, "order out for delivery");
        Ok(order)
    }

    /// Marks a shipped (or out-for-delivery) order as delivered,
    /// stamping `delivered_at` and the optional delivery notes.
    ///
    /// # Errors
    ///
    /// - [`ApiError::OrderNotFound`] when the order does not exist.
    /// - [`ApiError::InvalidTransition`] when delivery is not reachable
    ///   from the current status.
    pub async fn deliver(
        &self,
        id: OrderId,
        delivery_notes: Option<String>,
    ) -> Result<TransitionOutcome, ApiError> {
        let mut order = self.load(id).await?;
        ensure_transition(&order, OrderStatus::Delivered)?;

        order.status = OrderStatus::Delivered;
        order.delivered_at = Some(Utc::now());
        if delivery_notes.is_some() {
            order.delivery_notes = delivery_notes;
        }
        self.store(&order).await?;
        tracing::info!(order_id = %id, "order delivered");

        let (email_sent, email_error) = self.notify(messages::order_delivered(&order)).await;
        Ok(TransitionOutcome {
            order,
            email_sent,
            email_error,
        })
    }

    /// Fetches one order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::OrderNotFound`] when it does not exist.
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.load(id).await
    }

    /// Orders placed with the given customer email, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    pub async fn orders_by_email(&self, email: &str) -> Result<Vec<Order>, ApiError> {
        self.orders.by_customer_email(email).await
    }

    /// All orders plus dashboard stats, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    pub async fn list_orders(&self) -> Result<(Vec<Order>, OrderStats), ApiError> {
        let orders = self.orders.list().await?;
        let mut stats = OrderStats {
            total: orders.len(),
            ..OrderStats::default()
        };
        for order in &orders {
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Approved => stats.approved += 1,
                OrderStatus::Rejected => stats.rejected += 1,
                OrderStatus::Shipped => stats.shipped += 1,
                OrderStatus::OutForDelivery => stats.out_for_delivery += 1,
                OrderStatus::Delivered => stats.delivered += 1,
            }
            if order.status != OrderStatus::Rejected {
                stats.revenue += order.subtotal;
            }
        }
        Ok((orders, stats))
    }

    /// Removes an order record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::OrderNotFound`] when it does not exist.
    pub async fn delete_order(&self, id: OrderId) -> Result<(), ApiError> {
        if !self.orders.delete(id).await? {
            return Err(ApiError::OrderNotFound(id));
        }
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }

    async fn load(&self, id: OrderId) -> Result<Order, ApiError> {
        self.orders
            .get(id)
            .await?
            .ok_or(ApiError::OrderNotFound(id))
    }

    async fn store(&self, order: &Order) -> Result<(), ApiError> {
        if !self.orders.update(order).await? {
            return Err(ApiError::OrderNotFound(order.id));
        }
        Ok(())
    }

    /// Rejects the whole order when any line item is short, listing
    /// every shortage. Reads only; nothing is decremented here.
    async fn check_stock(&self, items: &[OrderItem]) -> Result<(), ApiError> {
        let mut unknown = Vec::new();
        let mut shortages = Vec::new();

        for item in items {
            match self.products.get(item.product_id).await? {
                None => unknown.push(format!("unknown product: {}", item.product_id)),
                Some(product) if product.stock < item.quantity => {
                    shortages.push(StockShortage {
                        product_id: item.product_id,
                        name: item.name.clone(),
                        requested: item.quantity,
                        available: product.stock,
                    });
                }
                Some(_) => {}
            }
        }

        if !unknown.is_empty() {
            return Err(ApiError::validation(unknown));
        }
        if !shortages.is_empty() {
            return Err(ApiError::InsufficientStock(shortages));
        }
        Ok(())
    }

    /// Applies the per-item conditional decrements. If one loses a race
    /// against a concurrent order, the decrements already applied are
    /// restored before the shortage is reported.
    async fn reserve_stock(&self, items: &[OrderItem]) -> Result<(), ApiError> {
        let mut applied: Vec<(crate::domain::ProductId, u32)> = Vec::with_capacity(items.len());

        for item in items {
            let reserved = self.products.decrease_stock(item.product_id, item.quantity).await?;
            if !reserved {
                for (product_id, quantity) in &applied {
                    let _ = self.products.increase_stock(*product_id, *quantity).await;
                }
                let available = self
                    .products
                    .get(item.product_id)
                    .await?
                    .map_or(0, |p| p.stock);
                return Err(ApiError::InsufficientStock(vec![StockShortage {
                    product_id: item.product_id,
                    name: item.name.clone(),
                    requested: item.quantity,
                    available,
                }]));
            }
            applied.push((item.product_id, item.quantity));
        }
        Ok(())
    }

    async fn release_stock(&self, items: &[OrderItem]) {
        for item in items {
            let _ = self.products.increase_stock(item.product_id, item.quantity).await;
        }
    }

    /// Awaits the send but treats failure as advisory.
    async fn notify(&self, message: EmailMessage) -> (bool, Option<String>) {
        match self.notifier.send(&message).await {
            Ok(()) => (true, None),
            Err(e) => {
                tracing::warn!(error = %e, to = %message.to, "notification failed");
                (false, Some(e.to_string()))
            }
        }
    }
}

fn ensure_transition(order: &Order, to: OrderStatus) -> Result<(), ApiError> {
    if order.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(ApiError::InvalidTransition {
            from: order.status,
            to,
        })
    }
}

/// Rejection email built at the call site so the admin's free-text
/// notes land directly in the body.
fn rejection_message(order: &Order) -> EmailMessage {
    let reason = order
        .admin_notes
        .as_deref()
        .map_or_else(String::new, |notes| format!("\nNote from our team: {notes}\n"));

    EmailMessage {
        to: order.customer.email.clone(),
        subject: format!("About your order {}", order.id),
        body: format!(
            "Hi {},\n\nUnfortunately we were unable to accept your order.\n{reason}\n\
             Any pending payment will not be captured.\n",
            order.customer.name
        ),
    }
}

fn validate_placement(
    customer: &CustomerInfo,
    items: &[OrderItem],
    subtotal: f64,
) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    if customer.name.trim().is_empty() {
        errors.push("customer name is required".to_string());
    }
    if customer.email.trim().is_empty() || !customer.email.contains('@') {
        errors.push("customer email is invalid".to_string());
    }
    if customer.address.trim().is_empty() {
        errors.push("shipping address is required".to_string());
    }
    if items.is_empty() {
        errors.push("order must contain at least one item".to_string());
    }
    for (index, item) in items.iter().enumerate() {
        if item.quantity == 0 {
            errors.push(format!("item {index}: quantity must be at least 1"));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            errors.push(format!("item {index}: price is invalid"));
        }
    }
    if !subtotal.is_finite() {
        errors.push("subtotal is invalid".to_string());
    } else if !items.is_empty() {
        let computed = Order::computed_subtotal(items);
        if (computed - subtotal).abs() > SUBTOTAL_TOLERANCE {
            errors.push(format!(
                "subtotal {subtotal:.2} does not match line items ({computed:.2})"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Product, ProductId};
    use crate::notify::SimulatedNotifier;
    use crate::persistence::json_file::JsonFileStore;
    use async_trait::async_trait;

    /// Notification channel that always fails, for the advisory-send
    /// contract tests.
    #[derive(Debug)]
    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _msg: &EmailMessage) -> Result<(), ApiError> {
            Err(ApiError::Notification("smtp unreachable".into()))
        }
    }

    async fn service_with(notifier: Arc<dyn Notifier>) -> (tempfile::TempDir, OrderService) {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let Ok(store) = JsonFileStore::open(dir.path()).await else {
            panic!("store open failed");
        };
        let store = Arc::new(store);
        let service = OrderService::new(
            Arc::clone(&store) as Arc<dyn OrderStore>,
            store as Arc<dyn ProductStore>,
            notifier,
        );
        (dir, service)
    }

    async fn service() -> (tempfile::TempDir, OrderService) {
        service_with(Arc::new(SimulatedNotifier)).await
    }

    async fn seed_product(service: &OrderService, stock: u32) -> Product {
        let product = Product {
            id: ProductId::new(),
            name: "Ring A".into(),
            price: 100.0,
            category: "rings".into(),
            subcategory: None,
            description: "A ring".into(),
            image_url: None,
            featured: false,
            is_new: false,
            bestseller: false,
            stock,
            low_stock_threshold: 2,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let created = service.products.create(&product).await;
        assert!(created.is_ok());
        product
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: "+1".into(),
            address: "1 Main St".into(),
            city: "Metropolis".into(),
            postal_code: "00001".into(),
            country: "US".into(),
        }
    }

    fn line(product: &Product, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity,
            category: product.category.clone(),
        }
    }

    async fn stock_of(service: &OrderService, id: ProductId) -> u32 {
        let Ok(Some(p)) = service.products.get(id).await else {
            panic!("product vanished");
        };
        p.stock
    }

    #[tokio::test]
    async fn placement_reserves_stock_and_creates_pending_order() {
        let (_dir, service) = service().await;
        let product = seed_product(&service, 5).await;

        let outcome = service
            .place_order(customer(), vec![line(&product, 3)], 300.0)
            .await;
        let Ok(outcome) = outcome else {
            panic!("placement failed");
        };
        assert_eq!(outcome.order.status, OrderStatus::Pending);
        assert!(outcome.email_sent);
        assert_eq!(stock_of(&service, product.id).await, 2);
    }

    #[tokio::test]
    async fn shortage_rejects_whole_order_without_side_effects() {
        let (_dir, service) = service().await;
        let product = seed_product(&service, 5).await;

        // First order takes 3, leaving 2.
        let first = service
            .place_order(customer(), vec![line(&product, 3)], 300.0)
            .await;
        assert!(first.is_ok());

        // Second order for 3 must fail listing available 2, stock unchanged.
        let second = service
            .place_order(customer(), vec![line(&product, 3)], 300.0)
            .await;
        let Err(ApiError::InsufficientStock(shortages)) = second else {
            panic!("expected stock error");
        };
        let Some(shortage) = shortages.first() else {
            panic!("expected one shortage");
        };
        assert_eq!(shortage.requested, 3);
        assert_eq!(shortage.available, 2);
        assert_eq!(stock_of(&service, product.id).await, 2);

        let Ok(orders) = service.orders.list().await else {
            panic!("list failed");
        };
        assert_eq!(orders.len(), 1);
    }

    #[tokio::test]
    async fn multi_item_shortage_decrements_nothing() {
        let (_dir, service) = service().await;
        let plenty = seed_product(&service, 10).await;
        let scarce = seed_product(&service, 1).await;

        let items = vec![line(&plenty, 2), line(&scarce, 5)];
        let subtotal = Order::computed_subtotal(&items);
        let result = service.place_order(customer(), items, subtotal).await;
        assert!(matches!(result, Err(ApiError::InsufficientStock(_))));

        assert_eq!(stock_of(&service, plenty.id).await, 10);
        assert_eq!(stock_of(&service, scarce.id).await, 1);
    }

    #[tokio::test]
    async fn subtotal_mismatch_is_rejected() {
        let (_dir, service) = service().await;
        let product = seed_product(&service, 5).await;

        let result = service
            .place_order(customer(), vec![line(&product, 2)], 150.0)
            .await;
        let Err(ApiError::Validation { errors }) = result else {
            panic!("expected validation error");
        };
        assert!(errors.iter().any(|e| e.contains("subtotal")));
        assert_eq!(stock_of(&service, product.id).await, 5);
    }

    #[tokio::test]
    async fn validation_lists_every_failing_field() {
        let (_dir, service) = service().await;
        let bad_customer = CustomerInfo {
            name: String::new(),
            email: "not-an-email".into(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            country: String::new(),
        };
        let result = service.place_order(bad_customer, vec![], 0.0).await;
        let Err(ApiError::Validation { errors }) = result else {
            panic!("expected validation error");
        };
        assert!(errors.len() >= 3);
    }

    #[tokio::test]
    async fn unknown_product_is_a_validation_error() {
        let (_dir, service) = service().await;
        let ghost = OrderItem {
            product_id: ProductId::new(),
            name: "Ghost".into(),
            price: 10.0,
            quantity: 1,
            category: "rings".into(),
        };
        let result = service.place_order(customer(), vec![ghost], 10.0).await;
        assert!(matches!(result, Err(ApiError::Validation { .. })));
    }

    #[tokio::test]
    async fn approval_survives_notification_failure() {
        let (_dir, service) = service_with(Arc::new(FailingNotifier)).await;
        let product = seed_product(&service, 5).await;

        let placed = service
            .place_order(customer(), vec![line(&product, 1)], 100.0)
            .await;
        let Ok(placed) = placed else {
            panic!("placement failed");
        };
        assert!(!placed.email_sent);

        let outcome = service
            .decide(placed.order.id, Decision::Approved, None)
            .await;
        let Ok(outcome) = outcome else {
            panic!("approval must succeed despite the notifier");
        };
        assert_eq!(outcome.order.status, OrderStatus::Approved);
        assert!(outcome.order.approved_at.is_some());
        assert!(!outcome.email_sent);
        assert!(outcome.email_error.is_some());

        // And it is durably recorded.
        let Ok(stored) = service.get_order(placed.order.id).await else {
            panic!("order vanished");
        };
        assert_eq!(stored.status, OrderStatus::Approved);
        assert!(stored.approved_at.is_some());
    }

    #[tokio::test]
    async fn rejection_keeps_admin_notes() {
        let (_dir, service) = service().await;
        let product = seed_product(&service, 5).await;
        let Ok(placed) = service
            .place_order(customer(), vec![line(&product, 1)], 100.0)
            .await
        else {
            panic!("placement failed");
        };

        let outcome = service
            .decide(
                placed.order.id,
                Decision::Rejected,
                Some("engraving not possible".into()),
            )
            .await;
        let Ok(outcome) = outcome else {
            panic!("rejection failed");
        };
        assert_eq!(outcome.order.status, OrderStatus::Rejected);
        assert_eq!(
            outcome.order.admin_notes.as_deref(),
            Some("engraving not possible")
        );
    }

    #[tokio::test]
    async fn shipping_requires_approval_first() {
        let (_dir, service) = service().await;
        let product = seed_product(&service, 5).await;
        let Ok(placed) = service
            .place_order(customer(), vec![line(&product, 1)], 100.0)
            .await
        else {
            panic!("placement failed");
        };

        let details = ShipmentDetails {
            tracking_id: "TRK-1".into(),
            provider: "DHL".into(),
            shipping_method: "express".into(),
            estimated_delivery: None,
        };
        let result = service.ship(placed.order.id, details).await;
        let Err(ApiError::InvalidTransition { from, to }) = result else {
            panic!("expected invalid transition");
        };
        assert_eq!(from, OrderStatus::Pending);
        assert_eq!(to, OrderStatus::Shipped);

        // Status unchanged.
        let Ok(stored) = service.get_order(placed.order.id).await else {
            panic!("order vanished");
        };
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn full_lifecycle_with_out_for_delivery() {
        let (_dir, service) = service().await;
        let product = seed_product(&service, 5).await;
        let Ok(placed) = service
            .place_order(customer(), vec![line(&product, 1)], 100.0)
            .await
        else {
            panic!("placement failed");
        };
        let id = placed.order.id;

        assert!(service.decide(id, Decision::Approved, None).await.is_ok());
        let shipped = service
            .ship(
                id,
                ShipmentDetails {
                    tracking_id: "TRK-1".into(),
                    provider: "DHL".into(),
                    shipping_method: "standard".into(),
                    estimated_delivery: None,
                },
            )
            .await;
        let Ok(shipped) = shipped else {
            panic!("ship failed");
        };
        assert!(shipped.order.shipping.is_some());

        assert!(service.mark_out_for_delivery(id).await.is_ok());

        let delivered = service.deliver(id, Some("left with neighbour".into())).await;
        let Ok(delivered) = delivered else {
            panic!("deliver failed");
        };
        assert!(delivered.order.delivered_at.is_some());
        assert_eq!(
            delivered.order.delivery_notes.as_deref(),
            Some("left with neighbour")
        );

        // Terminal: nothing moves out of delivered.
        let again = service.deliver(id, None).await;
        assert!(matches!(again, Err(ApiError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn same_status_twice_is_rejected() {
        let (_dir, service) = service().await;
        let product = seed_product(&service, 5).await;
        let Ok(placed) = service
            .place_order(customer(), vec![line(&product, 1)], 100.0)
            .await
        else {
            panic!("placement failed");
        };

        assert!(
            service
                .decide(placed.order.id, Decision::Approved, None)
                .await
                .is_ok()
        );
        let second = service.decide(placed.order.id, Decision::Approved, None).await;
        assert!(matches!(second, Err(ApiError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn stats_count_statuses_and_revenue() {
        let (_dir, service) = service().await;
        let product = seed_product(&service, 10).await;

        let Ok(a) = service
            .place_order(customer(), vec![line(&product, 1)], 100.0)
            .await
        else {
            panic!("placement failed");
        };
        let Ok(b) = service
            .place_order(customer(), vec![line(&product, 2)], 200.0)
            .await
        else {
            panic!("placement failed");
        };
        let _ = service.decide(a.order.id, Decision::Approved, None).await;
        let _ = service.decide(b.order.id, Decision::Rejected, None).await;

        let Ok((orders, stats)) = service.list_orders().await else {
            panic!("list failed");
        };
        assert_eq!(orders.len(), 2);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.rejected, 1);
        assert!((stats.revenue - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn lookup_by_email_is_case_insensitive() {
        let (_dir, service) = service().await;
        let product = seed_product(&service, 5).await;
        let Ok(_) = service
            .place_order(customer(), vec![line(&product, 1)], 100.0)
            .await
        else {
            panic!("placement failed");
        };

        let Ok(found) = service.orders_by_email("ADA@EXAMPLE.COM").await else {
            panic!("lookup failed");
        };
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_order_is_not_found() {
        let (_dir, service) = service().await;
        let result = service.delete_order(OrderId::new()).await;
        assert!(matches!(result, Err(ApiError::OrderNotFound(_))));
    }
}
