//! Persistence layer: interchangeable order/product stores.
//!
//! Two backends implement the same object-safe traits and are selected
//! by one configuration flag at startup: a PostgreSQL store
//! (`sqlx::PgPool`, per-row statements) and a flat-file JSON store
//! (whole-file rewrite per mutation, suitable only for small
//! single-instance deployments).

pub mod json_file;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{Order, OrderId, OrderStatus, Product, ProductId};
use crate::error::ApiError;

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL via `sqlx`.
    Postgres,
    /// One JSON array file per collection under a data directory.
    JsonFile,
}

impl StorageBackend {
    /// Parses the backend from its configuration string.
    ///
    /// Accepts `"postgres"` and `"json"` (case-insensitive); anything
    /// else falls back to Postgres.
    #[must_use]
    pub fn from_config(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "json" | "json_file" | "file" => Self::JsonFile,
            _ => Self::Postgres,
        }
    }
}

/// CRUD and queries over the orders collection.
#[async_trait]
pub trait OrderStore: Send + Sync + fmt::Debug {
    /// Persists a new order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn create(&self, order: &Order) -> Result<(), ApiError>;

    /// Fetches one order by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, ApiError>;

    /// Returns every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn list(&self) -> Result<Vec<Order>, ApiError>;

    /// Replaces the stored record for `order.id`. Returns `false` when
    /// no such order exists.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn update(&self, order: &Order) -> Result<bool, ApiError>;

    /// Deletes one order. Returns `false` when no such order exists.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn delete(&self, id: OrderId) -> Result<bool, ApiError>;

    /// Returns orders with the given status, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn by_status(&self, status: OrderStatus) -> Result<Vec<Order>, ApiError>;

    /// Returns orders whose customer email matches (case-insensitive),
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn by_customer_email(&self, email: &str) -> Result<Vec<Order>, ApiError>;
}

/// CRUD, queries, and stock mutation over the products collection.
#[async_trait]
pub trait ProductStore: Send + Sync + fmt::Debug {
    /// Persists a new product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn create(&self, product: &Product) -> Result<(), ApiError>;

    /// Fetches one product by ID (active or not).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn get(&self, id: ProductId) -> Result<Option<Product>, ApiError>;

    /// Returns products. With `include_inactive = false` only active
    /// products are returned (the public catalog view).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn list(&self, include_inactive: bool) -> Result<Vec<Product>, ApiError>;

    /// Replaces the stored record for `product.id`. Returns `false`
    /// when no such product exists.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn update(&self, product: &Product) -> Result<bool, ApiError>;

    /// Hard-deletes one product. Returns `false` when no such product
    /// exists. Historical orders keep their snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn delete(&self, id: ProductId) -> Result<bool, ApiError>;

    /// Active products in the given category.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn by_category(&self, category: &str) -> Result<Vec<Product>, ApiError>;

    /// Active products whose name or description contains `query`
    /// (case-insensitive substring).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn search(&self, query: &str) -> Result<Vec<Product>, ApiError>;

    /// Products at or below their low-stock threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn low_stock(&self) -> Result<Vec<Product>, ApiError>;

    /// Atomically decrements stock by `quantity` iff enough is
    /// available. Returns `false` when the product is missing or the
    /// stock is insufficient; no partial decrement ever happens.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn decrease_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ApiError>;

    /// Increments stock by `quantity`. Returns `false` when the product
    /// is missing. Used for admin restock and for compensating a failed
    /// multi-item reservation.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn increase_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ApiError>;

    /// Sets stock to an absolute value. Returns `false` when the
    /// product is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn set_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ApiError>;
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_config_strings() {
        assert_eq!(StorageBackend::from_config("json"), StorageBackend::JsonFile);
        assert_eq!(StorageBackend::from_config("JSON_FILE"), StorageBackend::JsonFile);
        assert_eq!(StorageBackend::from_config("postgres"), StorageBackend::Postgres);
        assert_eq!(StorageBackend::from_config("anything"), StorageBackend::Postgres);
    }
}
