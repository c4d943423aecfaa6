//! Request and response DTOs for the REST API.

pub mod order_dto;
pub mod product_dto;

pub use order_dto::{
    AdminOrderListResponse, DecisionRequest, DeliveryRequest, OrderLookupParams,
    OrderPlacedResponse, OrderResponse, PlaceOrderRequest, PublicOrderDto, PublicOrderListResponse,
    TransitionResponse,
};
pub use product_dto::{CatalogParams, ProductListResponse, StockResponse, StockUpdateRequest};
