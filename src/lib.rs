//! # bijoux-api
//!
//! REST backend for a direct-to-consumer jewelry storefront: product
//! catalog browsing, order placement with atomic stock reservation,
//! and an admin panel driving the order lifecycle from pending through
//! delivered. Customer email notifications are advisory; a failed send
//! never rolls back a persisted state change.
//!
//! ## Architecture
//!
//! ```text
//! Clients (storefront, admin panel)
//!     │
//!     ├── REST Handlers (api/)
//!     │     └── guards: rate limiter + admin key gate (security/)
//!     │
//!     ├── OrderService / CatalogService (service/)
//!     │     └── Notifier (notify/) — advisory email
//!     │
//!     ├── Order / Product model (domain/)
//!     │
//!     └── OrderStore / ProductStore (persistence/)
//!           ├── JSON file backend
//!           └── PostgreSQL backend
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod security;
pub mod service;
