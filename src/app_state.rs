//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::security::{AdminGate, RateLimiter};
use crate::service::{CatalogService, OrderService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Order placement and lifecycle logic.
    pub orders: Arc<OrderService>,
    /// Product catalog and inventory logic.
    pub catalog: Arc<CatalogService>,
    /// Fixed-window request limiter.
    pub rate_limiter: Arc<RateLimiter>,
    /// Admin key gate with lockout.
    pub admin_gate: Arc<AdminGate>,
}
