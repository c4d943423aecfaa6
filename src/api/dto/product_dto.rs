//! Product and inventory DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Product;

/// Query parameters for `GET /products`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CatalogParams {
    /// Category filter; ignored when `search` is present.
    #[serde(default)]
    pub category: Option<String>,
    /// Case-insensitive substring search over name and description.
    #[serde(default)]
    pub search: Option<String>,
}

/// Product list response shared by the public and admin catalogs.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    /// Matching products.
    pub products: Vec<Product>,
    /// Number of products returned.
    pub total: usize,
}

impl From<Vec<Product>> for ProductListResponse {
    fn from(products: Vec<Product>) -> Self {
        let total = products.len();
        Self { products, total }
    }
}

/// Request body for `PUT /admin/inventory/{id}`.
///
/// Exactly one of the two fields must be present.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StockUpdateRequest {
    /// Absolute stock level to set.
    #[serde(default)]
    pub set: Option<u32>,
    /// Quantity to subtract from current stock.
    #[serde(default)]
    pub decrease: Option<u32>,
}

/// Response body for `PUT /admin/inventory/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StockResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// The product after the stock mutation.
    pub product: Product,
    /// Whether the product is at or below its low-stock threshold.
    pub low_stock: bool,
}

impl From<Product> for StockResponse {
    fn from(product: Product) -> Self {
        let low_stock = product.is_low_stock();
        Self {
            success: true,
            product,
            low_stock,
        }
    }
}
