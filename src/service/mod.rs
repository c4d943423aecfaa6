//! Business-logic services wired into the application state.

pub mod catalog_service;
pub mod order_service;

pub use catalog_service::{CatalogService, NewProduct};
pub use order_service::{Decision, OrderService, OrderStats, ShipmentDetails, TransitionOutcome};
