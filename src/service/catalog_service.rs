//! Catalog service: product CRUD and inventory operations.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{Product, ProductId, ProductPatch};
use crate::error::{ApiError, StockShortage};
use crate::persistence::ProductStore;

/// Fields accepted when an admin creates a product.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewProduct {
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: f64,
    /// Top-level category.
    pub category: String,
    /// Optional subcategory.
    #[serde(default)]
    pub subcategory: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// URL of an already-uploaded product image.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Featured-strip flag.
    #[serde(default)]
    pub featured: bool,
    /// New-arrival flag.
    #[serde(default)]
    pub is_new: bool,
    /// Bestseller flag.
    #[serde(default)]
    pub bestseller: bool,
    /// Initial stock.
    #[serde(default)]
    pub stock: u32,
    /// Low-stock threshold for the admin report.
    #[serde(default)]
    pub low_stock_threshold: u32,
}

/// Orchestration layer for the product catalog and inventory.
#[derive(Debug)]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
}

impl CatalogService {
    /// Creates a new `CatalogService`.
    #[must_use]
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    /// Creates a product from admin input.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on an empty name or
    /// non-positive price.
    pub async fn create_product(&self, new: NewProduct) -> Result<Product, ApiError> {
        let mut errors = Vec::new();
        if new.name.trim().is_empty() {
            errors.push("product name is required".to_string());
        }
        if !new.price.is_finite() || new.price <= 0.0 {
            errors.push("price must be positive".to_string());
        }
        if new.category.trim().is_empty() {
            errors.push("category is required".to_string());
        }
        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }

        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            name: new.name,
            price: new.price,
            category: new.category,
            subcategory: new.subcategory,
            description: new.description,
            image_url: new.image_url,
            featured: new.featured,
            is_new: new.is_new,
            bestseller: new.bestseller,
            stock: new.stock,
            low_stock_threshold: new.low_stock_threshold,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.products.create(&product).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// Fetches one product regardless of its active flag (admin view,
    /// and the inventory endpoints).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ProductNotFound`] when it does not exist.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.products
            .get(id)
            .await?
            .ok_or(ApiError::ProductNotFound(id))
    }

    /// Fetches one product for the public storefront; inactive products
    /// are indistinguishable from missing ones.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ProductNotFound`] when missing or inactive.
    pub async fn get_public_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let product = self.get_product(id).await?;
        if !product.is_active {
            return Err(ApiError::ProductNotFound(id));
        }
        Ok(product)
    }

    /// Public catalog listing with optional category and substring
    /// filters. Search wins when both are supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    pub async fn list_public(
        &self,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<Product>, ApiError> {
        match (search, category) {
            (Some(query), _) if !query.trim().is_empty() => self.products.search(query).await,
            (_, Some(category)) if !category.trim().is_empty() => {
                self.products.by_category(category).await
            }
            _ => self.products.list(false).await,
        }
    }

    /// Admin listing including inactive products.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    pub async fn list_admin(&self) -> Result<Vec<Product>, ApiError> {
        self.products.list(true).await
    }

    /// Applies a partial admin update.
    ///
    /// # Errors
    ///
    /// - [`ApiError::ProductNotFound`] when the product does not exist.
    /// - [`ApiError::Validation`] on an empty name or non-positive price.
    pub async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, ApiError> {
        let mut errors = Vec::new();
        if let Some(name) = &patch.name
            && name.trim().is_empty()
        {
            errors.push("product name cannot be empty".to_string());
        }
        if let Some(price) = patch.price
            && (!price.is_finite() || price <= 0.0)
        {
            errors.push("price must be positive".to_string());
        }
        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }

        let mut product = self.get_product(id).await?;
        product.apply(patch);
        if !self.products.update(&product).await? {
            return Err(ApiError::ProductNotFound(id));
        }
        tracing::info!(product_id = %id, "product updated");
        Ok(product)
    }

    /// Hard-deletes a product. Historical orders keep their snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ProductNotFound`] when it does not exist.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        if !self.products.delete(id).await? {
            return Err(ApiError::ProductNotFound(id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Returns `true` when the product exists with at least `quantity`
    /// units available.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    pub async fn is_in_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ApiError> {
        Ok(self
            .products
            .get(id)
            .await?
            .is_some_and(|p| p.stock >= quantity))
    }

    /// Sets stock to an absolute value.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ProductNotFound`] when it does not exist.
    pub async fn set_stock(&self, id: ProductId, quantity: u32) -> Result<Product, ApiError> {
        if !self.products.set_stock(id, quantity).await? {
            return Err(ApiError::ProductNotFound(id));
        }
        tracing::info!(product_id = %id, stock = quantity, "stock set");
        self.get_product(id).await
    }

    /// Decrements stock, failing the whole operation when not enough is
    /// available.
    ///
    /// # Errors
    ///
    /// - [`ApiError::ProductNotFound`] when the product does not exist.
    /// - [`ApiError::InsufficientStock`] when the decrement would go
    ///   negative; nothing is changed in that case.
    pub async fn decrease_stock(&self, id: ProductId, quantity: u32) -> Result<Product, ApiError> {
        if self.products.decrease_stock(id, quantity).await? {
            return self.get_product(id).await;
        }
        let product = self.get_product(id).await?;
        Err(ApiError::InsufficientStock(vec![StockShortage {
            product_id: id,
            name: product.name,
            requested: quantity,
            available: product.stock,
        }]))
    }

    /// Products at or below their low-stock threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    pub async fn low_stock_report(&self) -> Result<Vec<Product>, ApiError> {
        self.products.low_stock().await
    }
}
