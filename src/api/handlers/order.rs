//! Public order handlers: placement, lookup, email history.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    OrderLookupParams, OrderPlacedResponse, PlaceOrderRequest, PublicOrderDto,
    PublicOrderListResponse,
};
use crate::api::guard;
use crate::app_state::AppState;
use crate::domain::OrderId;
use crate::error::{ApiError, ErrorResponse};
use crate::security::EndpointClass;

/// `POST /orders` — Place a new order.
///
/// # Errors
///
/// Returns [`ApiError`] on validation failure, insufficient stock, or
/// an exhausted placement budget.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "Orders",
    summary = "Place an order",
    description = "Validates the payload, verifies the subtotal server-side, reserves stock atomically, and persists the order as pending. A confirmation email is attempted; its failure never fails the order.",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderPlacedResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 422, description = "Insufficient stock", body = ErrorResponse),
        (status = 429, description = "Placement budget exhausted", body = ErrorResponse),
    )
)]
pub async fn place_order(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let decision = guard::guard_public(&state, &client, EndpointClass::PlaceOrder).await?;

    let outcome = state
        .orders
        .place_order(req.customer, req.items, req.subtotal)
        .await?;

    Ok((
        StatusCode::CREATED,
        guard::rate_headers(&decision),
        Json(OrderPlacedResponse::from(outcome)),
    ))
}

/// `GET /orders/{id}` — Customer-facing order lookup.
///
/// # Errors
///
/// Returns [`ApiError::OrderNotFound`] when the order does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    tag = "Orders",
    summary = "Look up an order",
    description = "Returns the sanitized order view: status, items, and tracking details, without the customer's contact information.",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = PublicOrderDto),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 429, description = "Public budget exhausted", body = ErrorResponse),
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let decision = guard::guard_public(&state, &client, EndpointClass::Public).await?;

    let order = state.orders.get_order(OrderId::from_uuid(id)).await?;
    Ok((
        guard::rate_headers(&decision),
        Json(PublicOrderDto::from(order)),
    ))
}

/// `GET /orders?email=` — Orders placed with a customer email.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] when the email parameter is blank.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    tag = "Orders",
    summary = "List orders by customer email",
    description = "Returns sanitized orders placed with the given email, newest first. The match is case-insensitive.",
    params(OrderLookupParams),
    responses(
        (status = 200, description = "Matching orders", body = PublicOrderListResponse),
        (status = 400, description = "Missing email", body = ErrorResponse),
        (status = 429, description = "Public budget exhausted", body = ErrorResponse),
    )
)]
pub async fn list_orders_by_email(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<OrderLookupParams>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let decision = guard::guard_public(&state, &client, EndpointClass::Public).await?;

    if params.email.trim().is_empty() {
        return Err(ApiError::validation(vec![
            "email query parameter is required".to_string(),
        ]));
    }

    let orders = state.orders.orders_by_email(params.email.trim()).await?;
    let orders: Vec<PublicOrderDto> = orders.into_iter().map(PublicOrderDto::from).collect();
    let total = orders.len();
    Ok((
        guard::rate_headers(&decision),
        Json(PublicOrderListResponse { orders, total }),
    ))
}

/// Public order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(place_order).get(list_orders_by_email))
        .route("/orders/{id}", get(get_order))
}
