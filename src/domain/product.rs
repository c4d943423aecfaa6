//! Catalog product and admin patch application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ProductId;

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: f64,
    /// Top-level category (e.g. `"rings"`).
    pub category: String,
    /// Optional subcategory.
    pub subcategory: Option<String>,
    /// Free-text description.
    pub description: String,
    /// URL of the product image, when one was uploaded.
    pub image_url: Option<String>,
    /// Shown in the featured strip.
    pub featured: bool,
    /// Marked as a new arrival.
    pub is_new: bool,
    /// Marked as a bestseller.
    pub bestseller: bool,
    /// Units available. Mutated only by admin stock-set or by the
    /// order-placement decrement.
    pub stock: u32,
    /// `stock <= low_stock_threshold` flags the product for the admin
    /// report. Never blocks checkout.
    pub low_stock_threshold: u32,
    /// Soft-delete flag: inactive products are hidden from public
    /// listings but remain referenced by historical orders.
    pub is_active: bool,
    /// Creation timestamp, maintained by the persistence adapter.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp, maintained by the persistence adapter.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns `true` if the product is at or below its low-stock
    /// threshold.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }

    /// Applies a partial admin update and bumps `updated_at`.
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(subcategory) = patch.subcategory {
            self.subcategory = Some(subcategory);
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = Some(image_url);
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(is_new) = patch.is_new {
            self.is_new = is_new;
        }
        if let Some(bestseller) = patch.bestseller {
            self.bestseller = bestseller;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(threshold) = patch.low_stock_threshold {
            self.low_stock_threshold = threshold;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update for a product; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductPatch {
    /// New display name.
    pub name: Option<String>,
    /// New unit price.
    pub price: Option<f64>,
    /// New category.
    pub category: Option<String>,
    /// New subcategory.
    pub subcategory: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New image URL.
    pub image_url: Option<String>,
    /// New featured flag.
    pub featured: Option<bool>,
    /// New new-arrival flag.
    pub is_new: Option<bool>,
    /// New bestseller flag.
    pub bestseller: Option<bool>,
    /// New stock count.
    pub stock: Option<u32>,
    /// New low-stock threshold.
    pub low_stock_threshold: Option<u32>,
    /// New active flag.
    pub is_active: Option<bool>,
}
