//! PostgreSQL implementation of the persistence layer.
//!
//! Per-row statements over `sqlx::PgPool`. Customer, item, and shipping
//! snapshots are stored as JSONB; the stock decrement is a single
//! conditional `UPDATE`, so concurrent orders can never over-sell a
//! product.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{OrderStore, ProductStore};
use crate::domain::{Order, OrderId, OrderStatus, Product, ProductId};
use crate::error::ApiError;

/// PostgreSQL-backed store for both collections.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

type OrderRow = (
    Uuid,
    serde_json::Value,
    serde_json::Value,
    f64,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
    Option<String>,
    Option<String>,
    Option<serde_json::Value>,
);

type ProductRow = (
    Uuid,
    String,
    f64,
    String,
    Option<String>,
    String,
    Option<String>,
    bool,
    bool,
    bool,
    i64,
    i64,
    bool,
    DateTime<Utc>,
    DateTime<Utc>,
);

const ORDER_COLUMNS: &str = "id, customer, items, subtotal, status, created_at, \
     approved_at, delivered_at, admin_notes, delivery_notes, shipping";

const PRODUCT_COLUMNS: &str = "id, name, price, category, subcategory, description, image_url, \
     featured, is_new, bestseller, stock, low_stock_threshold, is_active, created_at, updated_at";

impl PostgresStore {
    /// Creates a store around the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs pending migrations from the bundled `migrations/` directory.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] when a migration fails.
    pub async fn migrate(&self) -> Result<(), ApiError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Persistence(e.to_string()))
    }
}

fn persistence_err(e: sqlx::Error) -> ApiError {
    ApiError::Persistence(e.to_string())
}

fn order_from_row(row: OrderRow) -> Result<Order, ApiError> {
    let (
        id,
        customer,
        items,
        subtotal,
        status,
        created_at,
        approved_at,
        delivered_at,
        admin_notes,
        delivery_notes,
        shipping,
    ) = row;

    Ok(Order {
        id: OrderId::from_uuid(id),
        customer: serde_json::from_value(customer)
            .map_err(|e| ApiError::Persistence(format!("decode customer: {e}")))?,
        items: serde_json::from_value(items)
            .map_err(|e| ApiError::Persistence(format!("decode items: {e}")))?,
        subtotal,
        status: status
            .parse::<OrderStatus>()
            .map_err(ApiError::Persistence)?,
        created_at,
        approved_at,
        delivered_at,
        admin_notes,
        delivery_notes,
        shipping: shipping
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ApiError::Persistence(format!("decode shipping: {e}")))?,
    })
}

fn product_from_row(row: ProductRow) -> Product {
    let (
        id,
        name,
        price,
        category,
        subcategory,
        description,
        image_url,
        featured,
        is_new,
        bestseller,
        stock,
        low_stock_threshold,
        is_active,
        created_at,
        updated_at,
    ) = row;

    Product {
        id: ProductId::from_uuid(id),
        name,
        price,
        category,
        subcategory,
        description,
        image_url,
        featured,
        is_new,
        bestseller,
        stock: u32::try_from(stock).unwrap_or(0),
        low_stock_threshold: u32::try_from(low_stock_threshold).unwrap_or(0),
        is_active,
        created_at,
        updated_at,
    }
}

fn json_value<T: serde::Serialize>(value: &T, what: &str) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Persistence(format!("encode {what}: {e}")))
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn create(&self, order: &Order) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO orders (id, customer, items, subtotal, status, created_at, \
             approved_at, delivered_at, admin_notes, delivery_notes, shipping) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(order.id.as_uuid())
        .bind(json_value(&order.customer, "customer")?)
        .bind(json_value(&order.items, "items")?)
        .bind(order.subtotal)
        .bind(order.status.to_string())
        .bind(order.created_at)
        .bind(order.approved_at)
        .bind(order.delivered_at)
        .bind(order.admin_notes.as_deref())
        .bind(order.delivery_notes.as_deref())
        .bind(
            order
                .shipping
                .as_ref()
                .map(|s| json_value(s, "shipping"))
                .transpose()?,
        )
        .execute(&self.pool)
        .await
        .map_err(persistence_err)?;

        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, ApiError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence_err)?;

        row.map(order_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Order>, ApiError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_err)?;

        rows.into_iter().map(order_from_row).collect()
    }

    async fn update(&self, order: &Order) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE orders SET customer = $2, items = $3, subtotal = $4, status = $5, \
             approved_at = $6, delivered_at = $7, admin_notes = $8, delivery_notes = $9, \
             shipping = $10 WHERE id = $1",
        )
        .bind(order.id.as_uuid())
        .bind(json_value(&order.customer, "customer")?)
        .bind(json_value(&order.items, "items")?)
        .bind(order.subtotal)
        .bind(order.status.to_string())
        .bind(order.approved_at)
        .bind(order.delivered_at)
        .bind(order.admin_notes.as_deref())
        .bind(order.delivery_notes.as_deref())
        .bind(
            order
                .shipping
                .as_ref()
                .map(|s| json_value(s, "shipping"))
                .transpose()?,
        )
        .execute(&self.pool)
        .await
        .map_err(persistence_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: OrderId) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(persistence_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn by_status(&self, status: OrderStatus) -> Result<Vec<Order>, ApiError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 ORDER BY created_at DESC"
        ))
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_err)?;

        rows.into_iter().map(order_from_row).collect()
    }

    async fn by_customer_email(&self, email: &str) -> Result<Vec<Order>, ApiError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE LOWER(customer->>'email') = LOWER($1) ORDER BY created_at DESC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_err)?;

        rows.into_iter().map(order_from_row).collect()
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn create(&self, product: &Product) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO products (id, name, price, category, subcategory, description, \
             image_url, featured, is_new, bestseller, stock, low_stock_threshold, is_active, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.category)
        .bind(product.subcategory.as_deref())
        .bind(&product.description)
        .bind(product.image_url.as_deref())
        .bind(product.featured)
        .bind(product.is_new)
        .bind(product.bestseller)
        .bind(i64::from(product.stock))
        .bind(i64::from(product.low_stock_threshold))
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(persistence_err)?;

        Ok(())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence_err)?;

        Ok(row.map(product_from_row))
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Product>, ApiError> {
        let sql = if include_inactive {
            format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC")
        } else {
            format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active \
                 ORDER BY created_at DESC"
            )
        };
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence_err)?;

        Ok(rows.into_iter().map(product_from_row).collect())
    }

    async fn update(&self, product: &Product) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE products SET name = $2, price = $3, category = $4, subcategory = $5, \
             description = $6, image_url = $7, featured = $8, is_new = $9, bestseller = $10, \
             stock = $11, low_stock_threshold = $12, is_active = $13, updated_at = $14 \
             WHERE id = $1",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.category)
        .bind(product.subcategory.as_deref())
        .bind(&product.description)
        .bind(product.image_url.as_deref())
        .bind(product.featured)
        .bind(product.is_new)
        .bind(product.bestseller)
        .bind(i64::from(product.stock))
        .bind(i64::from(product.low_stock_threshold))
        .bind(product.is_active)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(persistence_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(persistence_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active AND LOWER(category) = LOWER($1) ORDER BY created_at DESC"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_err)?;

        Ok(rows.into_iter().map(product_from_row).collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active AND (name ILIKE '%' || $1 || '%' \
             OR description ILIKE '%' || $1 || '%') ORDER BY created_at DESC"
        ))
        .bind(query)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_err)?;

        Ok(rows.into_iter().map(product_from_row).collect())
    }

    async fn low_stock(&self) -> Result<Vec<Product>, ApiError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE stock <= low_stock_threshold ORDER BY stock ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_err)?;

        Ok(rows.into_iter().map(product_from_row).collect())
    }

    async fn decrease_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ApiError> {
        // Conditional update: the check and the decrement are one
        // statement, so concurrent orders cannot both pass the check.
        let result = sqlx::query(
            "UPDATE products SET stock = stock - $2, updated_at = NOW() \
             WHERE id = $1 AND stock >= $2",
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await
        .map_err(persistence_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn increase_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await
        .map_err(persistence_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ApiError> {
        let result =
            sqlx::query("UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1")
                .bind(id.as_uuid())
                .bind(i64::from(quantity))
                .execute(&self.pool)
                .await
                .map_err(persistence_err)?;

        Ok(result.rows_affected() == 1)
    }
}
