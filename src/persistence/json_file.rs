//! Flat-file JSON implementation of the persistence layer.
//!
//! One JSON array per collection (`orders.json`, `products.json`)
//! under a data directory. Every mutation loads the whole file,
//! mutates in memory, and rewrites the file. A per-collection
//! `tokio::sync::Mutex` serializes writers inside this process, which
//! also makes the conditional stock decrement atomic; across processes
//! the last writer wins on the whole-file rewrite (documented
//! limitation of this backend).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use super::{OrderStore, ProductStore};
use crate::domain::{Order, OrderId, OrderStatus, Product, ProductId};
use crate::error::ApiError;

/// File-backed store for both collections.
#[derive(Debug)]
pub struct JsonFileStore {
    orders_path: PathBuf,
    products_path: PathBuf,
    orders_lock: Mutex<()>,
    products_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (and creates, if needed) the data directory.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] when the directory cannot be
    /// created.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, ApiError> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|e| ApiError::Persistence(format!("create {}: {e}", data_dir.display())))?;

        Ok(Self {
            orders_path: data_dir.join("orders.json"),
            products_path: data_dir.join("products.json"),
            orders_lock: Mutex::new(()),
            products_lock: Mutex::new(()),
        })
    }
}

/// Reads a whole collection; a missing file is an empty collection.
async fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ApiError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Persistence(format!("parse {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(ApiError::Persistence(format!(
            "read {}: {e}",
            path.display()
        ))),
    }
}

/// Rewrites a whole collection file.
async fn write_collection<T: Serialize>(path: &Path, items: &[T]) -> Result<(), ApiError> {
    let bytes = serde_json::to_vec_pretty(items)
        .map_err(|e| ApiError::Persistence(format!("encode {}: {e}", path.display())))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ApiError::Persistence(format!("write {}: {e}", path.display())))
}

#[async_trait]
impl OrderStore for JsonFileStore {
    async fn create(&self, order: &Order) -> Result<(), ApiError> {
        let _guard = self.orders_lock.lock().await;
        let mut orders: Vec<Order> = read_collection(&self.orders_path).await?;
        orders.push(order.clone());
        write_collection(&self.orders_path, &orders).await
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, ApiError> {
        let _guard = self.orders_lock.lock().await;
        let orders: Vec<Order> = read_collection(&self.orders_path).await?;
        Ok(orders.into_iter().find(|o| o.id == id))
    }

    async fn list(&self) -> Result<Vec<Order>, ApiError> {
        let _guard = self.orders_lock.lock().await;
        let mut orders: Vec<Order> = read_collection(&self.orders_path).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update(&self, order: &Order) -> Result<bool, ApiError> {
        let _guard = self.orders_lock.lock().await;
        let mut orders: Vec<Order> = read_collection(&self.orders_path).await?;
        let Some(slot) = orders.iter_mut().find(|o| o.id == order.id) else {
            return Ok(false);
        };
        *slot = order.clone();
        write_collection(&self.orders_path, &orders).await?;
        Ok(true)
    }

    async fn delete(&self, id: OrderId) -> Result<bool, ApiError> {
        let _guard = self.orders_lock.lock().await;
        let mut orders: Vec<Order> = read_collection(&self.orders_path).await?;
        let before = orders.len();
        orders.retain(|o| o.id != id);
        if orders.len() == before {
            return Ok(false);
        }
        write_collection(&self.orders_path, &orders).await?;
        Ok(true)
    }

    async fn by_status(&self, status: OrderStatus) -> Result<Vec<Order>, ApiError> {
        let mut orders = OrderStore::list(self).await?;
        orders.retain(|o| o.status == status);
        Ok(orders)
    }

    async fn by_customer_email(&self, email: &str) -> Result<Vec<Order>, ApiError> {
        let mut orders = OrderStore::list(self).await?;
        orders.retain(|o| o.customer.email.eq_ignore_ascii_case(email));
        Ok(orders)
    }
}

#[async_trait]
impl ProductStore for JsonFileStore {
    async fn create(&self, product: &Product) -> Result<(), ApiError> {
        let _guard = self.products_lock.lock().await;
        let mut products: Vec<Product> = read_collection(&self.products_path).await?;
        products.push(product.clone());
        write_collection(&self.products_path, &products).await
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
        let _guard = self.products_lock.lock().await;
        let products: Vec<Product> = read_collection(&self.products_path).await?;
        Ok(products.into_iter().find(|p| p.id == id))
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Product>, ApiError> {
        let _guard = self.products_lock.lock().await;
        let mut products: Vec<Product> = read_collection(&self.products_path).await?;
        if !include_inactive {
            products.retain(|p| p.is_active);
        }
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn update(&self, product: &Product) -> Result<bool, ApiError> {
        let _guard = self.products_lock.lock().await;
        let mut products: Vec<Product> = read_collection(&self.products_path).await?;
        let Some(slot) = products.iter_mut().find(|p| p.id == product.id) else {
            return Ok(false);
        };
        *slot = product.clone();
        write_collection(&self.products_path, &products).await?;
        Ok(true)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, ApiError> {
        let _guard = self.products_lock.lock().await;
        let mut products: Vec<Product> = read_collection(&self.products_path).await?;
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Ok(false);
        }
        write_collection(&self.products_path, &products).await?;
        Ok(true)
    }

    async fn by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
        let mut products = ProductStore::list(self, false).await?;
        products.retain(|p| p.category.eq_ignore_ascii_case(category));
        Ok(products)
    }

    async fn search(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let needle = query.to_lowercase();
        let mut products = ProductStore::list(self, false).await?;
        products.retain(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        });
        Ok(products)
    }

    async fn low_stock(&self) -> Result<Vec<Product>, ApiError> {
        let mut products = ProductStore::list(self, true).await?;
        products.retain(Product::is_low_stock);
        Ok(products)
    }

    async fn decrease_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ApiError> {
        // Check and write happen under the collection lock, so the
        // decrement is atomic within this process.
        let _guard = self.products_lock.lock().await;
        let mut products: Vec<Product> = read_collection(&self.products_path).await?;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        if product.stock < quantity {
            return Ok(false);
        }
        product.stock -= quantity;
        product.updated_at = Utc::now();
        write_collection(&self.products_path, &products).await?;
        Ok(true)
    }

    async fn increase_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ApiError> {
        let _guard = self.products_lock.lock().await;
        let mut products: Vec<Product> = read_collection(&self.products_path).await?;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        product.stock = product.stock.saturating_add(quantity);
        product.updated_at = Utc::now();
        write_collection(&self.products_path, &products).await?;
        Ok(true)
    }

    async fn set_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ApiError> {
        let _guard = self.products_lock.lock().await;
        let mut products: Vec<Product> = read_collection(&self.products_path).await?;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        product.stock = quantity;
        product.updated_at = Utc::now();
        write_collection(&self.products_path, &products).await?;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::CustomerInfo;

    async fn store() -> (tempfile::TempDir, JsonFileStore) {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir creation failed");
        };
        let Ok(store) = JsonFileStore::open(dir.path()).await else {
            panic!("store open failed");
        };
        (dir, store)
    }

    fn product(name: &str, stock: u32, threshold: u32) -> Product {
        Product {
            id: ProductId::new(),
            name: name.into(),
            price: 100.0,
            category: "rings".into(),
            subcategory: None,
            description: "A fine piece".into(),
            image_url: None,
            featured: false,
            is_new: false,
            bestseller: false,
            stock,
            low_stock_threshold: threshold,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(email: &str) -> Order {
        Order::new(
            CustomerInfo {
                name: "Ada".into(),
                email: email.into(),
                phone: "+1".into(),
                address: "1 Main St".into(),
                city: "Metropolis".into(),
                postal_code: "00001".into(),
                country: "US".into(),
            },
            vec![],
            0.0,
        )
    }

    #[tokio::test]
    async fn product_create_then_get_round_trips() {
        let (_dir, store) = store().await;
        let p = product("Ring A", 5, 2);

        let created = ProductStore::create(&store, &p).await;
        assert!(created.is_ok());

        let fetched = ProductStore::get(&store, p.id).await;
        let Ok(Some(fetched)) = fetched else {
            panic!("expected product back");
        };
        assert_eq!(fetched.name, p.name);
        assert!((fetched.price - p.price).abs() < f64::EPSILON);
        assert_eq!(fetched.stock, p.stock);
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let (_dir, store) = store().await;
        let listed = ProductStore::list(&store, true).await;
        let Ok(listed) = listed else {
            panic!("expected empty list");
        };
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn inactive_products_hidden_from_public_list() {
        let (_dir, store) = store().await;
        let mut p = product("Hidden", 5, 2);
        p.is_active = false;
        let _ = ProductStore::create(&store, &p).await;
        let _ = ProductStore::create(&store, &product("Visible", 5, 2)).await;

        let Ok(public) = ProductStore::list(&store, false).await else {
            panic!("list failed");
        };
        assert_eq!(public.len(), 1);
        let Ok(admin) = ProductStore::list(&store, true).await else {
            panic!("list failed");
        };
        assert_eq!(admin.len(), 2);
    }

    #[tokio::test]
    async fn decrease_stock_is_conditional() {
        let (_dir, store) = store().await;
        let p = product("Ring A", 5, 2);
        let _ = ProductStore::create(&store, &p).await;

        let Ok(true) = store.decrease_stock(p.id, 3).await else {
            panic!("expected decrement to succeed");
        };
        let Ok(false) = store.decrease_stock(p.id, 3).await else {
            panic!("expected decrement to fail on short stock");
        };

        // No partial decrement happened.
        let Ok(Some(after)) = ProductStore::get(&store, p.id).await else {
            panic!("product vanished");
        };
        assert_eq!(after.stock, 2);
    }

    #[tokio::test]
    async fn decrease_stock_missing_product_is_false() {
        let (_dir, store) = store().await;
        let Ok(false) = store.decrease_stock(ProductId::new(), 1).await else {
            panic!("expected false for missing product");
        };
    }

    #[tokio::test]
    async fn set_and_increase_stock() {
        let (_dir, store) = store().await;
        let p = product("Ring A", 1, 2);
        let _ = ProductStore::create(&store, &p).await;

        let _ = store.set_stock(p.id, 10).await;
        let _ = store.increase_stock(p.id, 5).await;

        let Ok(Some(after)) = ProductStore::get(&store, p.id).await else {
            panic!("product vanished");
        };
        assert_eq!(after.stock, 15);
    }

    #[tokio::test]
    async fn low_stock_uses_threshold_inclusive() {
        let (_dir, store) = store().await;
        let _ = ProductStore::create(&store, &product("Low", 2, 2)).await;
        let _ = ProductStore::create(&store, &product("Fine", 5, 2)).await;

        let Ok(low) = store.low_stock().await else {
            panic!("low_stock failed");
        };
        assert_eq!(low.len(), 1);
        assert_eq!(low.first().map(|p| p.name.as_str()), Some("Low"));
    }

    #[tokio::test]
    async fn search_matches_name_and_description() {
        let (_dir, store) = store().await;
        let _ = ProductStore::create(&store, &product("Gold Ring", 5, 2)).await;
        let mut p = product("Bracelet", 5, 2);
        p.description = "with a gold clasp".into();
        let _ = ProductStore::create(&store, &p).await;

        let Ok(hits) = store.search("GOLD").await else {
            panic!("search failed");
        };
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn order_update_and_queries() {
        let (_dir, store) = store().await;
        let mut o = order("ada@example.com");
        let _ = OrderStore::create(&store, &o).await;
        let _ = OrderStore::create(&store, &order("grace@example.com")).await;

        o.status = OrderStatus::Approved;
        o.approved_at = Some(Utc::now());
        let Ok(true) = OrderStore::update(&store, &o).await else {
            panic!("update failed");
        };

        let Ok(approved) = store.by_status(OrderStatus::Approved).await else {
            panic!("by_status failed");
        };
        assert_eq!(approved.len(), 1);

        let Ok(by_email) = store.by_customer_email("ADA@example.com").await else {
            panic!("by_customer_email failed");
        };
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email.first().map(|o| o.id), Some(o.id));
    }

    #[tokio::test]
    async fn order_delete_reports_presence() {
        let (_dir, store) = store().await;
        let o = order("ada@example.com");
        let _ = OrderStore::create(&store, &o).await;

        let Ok(true) = OrderStore::delete(&store, o.id).await else {
            panic!("expected delete to hit");
        };
        let Ok(false) = OrderStore::delete(&store, o.id).await else {
            panic!("expected delete to miss");
        };
    }

    #[tokio::test]
    async fn update_missing_order_returns_false() {
        let (_dir, store) = store().await;
        let o = order("ada@example.com");
        let Ok(false) = OrderStore::update(&store, &o).await else {
            panic!("expected false for missing order");
        };
    }
}
