//! Domain types: orders, products, and their identifiers.

pub mod id;
pub mod order;
pub mod product;

pub use id::{OrderId, ProductId};
pub use order::{CustomerInfo, Order, OrderItem, OrderStatus, ShippingInfo};
pub use product::{Product, ProductPatch};
