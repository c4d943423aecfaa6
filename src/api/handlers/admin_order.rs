//! Admin order handlers: dashboard listing, decisions, and fulfilment.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AdminOrderListResponse, DecisionRequest, DeliveryRequest, OrderResponse, TransitionResponse,
};
use crate::api::guard::{self, AdminKeyParams};
use crate::app_state::AppState;
use crate::domain::OrderId;
use crate::error::{ApiError, ErrorResponse};
use crate::service::ShipmentDetails;

/// `GET /admin/orders` — All orders plus dashboard stats.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] on a bad key and
/// [`ApiError::LockedOut`] after repeated failures.
#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    tag = "Admin Orders",
    summary = "List all orders",
    description = "Returns every order, newest first, with per-status counts and revenue. Revenue excludes rejected orders.",
    params(AdminKeyParams),
    responses(
        (status = 200, description = "Orders and stats", body = AdminOrderListResponse),
        (status = 401, description = "Bad or missing admin key", body = ErrorResponse),
        (status = 429, description = "Throttled or locked out", body = ErrorResponse),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<AdminKeyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    let (orders, stats) = state.orders.list_orders().await?;
    Ok(Json(AdminOrderListResponse { orders, stats }))
}

/// `POST /admin/orders/{id}/decision` — Approve or reject a pending order.
///
/// # Errors
///
/// Returns [`ApiError::InvalidTransition`] when the order is not
/// pending.
#[utoipa::path(
    post,
    path = "/api/v1/admin/orders/{id}/decision",
    tag = "Admin Orders",
    summary = "Decide a pending order",
    description = "Moves a pending order to approved or rejected and emails the customer. The decision is persisted even when the email fails; the response reports the email outcome.",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
        AdminKeyParams,
    ),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision applied", body = TransitionResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 409, description = "Order is not pending", body = ErrorResponse),
    )
)]
pub async fn decide_order(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<AdminKeyParams>,
    Json(req): Json<DecisionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    let outcome = state
        .orders
        .decide(OrderId::from_uuid(id), req.action, req.admin_notes)
        .await?;
    Ok(Json(TransitionResponse::from(outcome)))
}

/// `POST /admin/orders/{id}/ship` — Mark an approved order shipped.
///
/// # Errors
///
/// Returns [`ApiError::InvalidTransition`] when the order is not
/// approved.
#[utoipa::path(
    post,
    path = "/api/v1/admin/orders/{id}/ship",
    tag = "Admin Orders",
    summary = "Ship an order",
    description = "Attaches tracking details and moves an approved order to shipped, emailing the customer the tracking information.",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
        AdminKeyParams,
    ),
    request_body = ShipmentDetails,
    responses(
        (status = 200, description = "Order shipped", body = TransitionResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 409, description = "Order is not approved", body = ErrorResponse),
    )
)]
pub async fn ship_order(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<AdminKeyParams>,
    Json(details): Json<ShipmentDetails>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    let outcome = state.orders.ship(OrderId::from_uuid(id), details).await?;
    Ok(Json(TransitionResponse::from(outcome)))
}

/// `POST /admin/orders/{id}/out-for-delivery` — Advance a shipped order.
///
/// # Errors
///
/// Returns [`ApiError::InvalidTransition`] when the order is not
/// shipped.
#[utoipa::path(
    post,
    path = "/api/v1/admin/orders/{id}/out-for-delivery",
    tag = "Admin Orders",
    summary = "Mark an order out for delivery",
    description = "Optional hop between shipped and delivered. No customer email is attached to this transition.",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
        AdminKeyParams,
    ),
    responses(
        (status = 200, description = "Order out for delivery", body = OrderResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 409, description = "Order is not shipped", body = ErrorResponse),
    )
)]
pub async fn out_for_delivery(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<AdminKeyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    let order = state
        .orders
        .mark_out_for_delivery(OrderId::from_uuid(id))
        .await?;
    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}

/// `POST /admin/orders/{id}/deliver` — Close out an order as delivered.
///
/// # Errors
///
/// Returns [`ApiError::InvalidTransition`] when the order is neither
/// shipped nor out for delivery.
#[utoipa::path(
    post,
    path = "/api/v1/admin/orders/{id}/deliver",
    tag = "Admin Orders",
    summary = "Mark an order delivered",
    description = "Moves a shipped or out-for-delivery order to delivered and emails the customer. Delivered is terminal.",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
        AdminKeyParams,
    ),
    request_body = DeliveryRequest,
    responses(
        (status = 200, description = "Order delivered", body = TransitionResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 409, description = "Order cannot be delivered", body = ErrorResponse),
    )
)]
pub async fn deliver_order(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<AdminKeyParams>,
    Json(req): Json<DeliveryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    let outcome = state
        .orders
        .deliver(OrderId::from_uuid(id), req.delivery_notes)
        .await?;
    Ok(Json(TransitionResponse::from(outcome)))
}

/// `DELETE /admin/orders/{id}` — Remove an order.
///
/// # Errors
///
/// Returns [`ApiError::OrderNotFound`] when the order does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/orders/{id}",
    tag = "Admin Orders",
    summary = "Delete an order",
    description = "Hard-deletes an order in any status. Stock is not restored.",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
        AdminKeyParams,
    ),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = ErrorResponse),
    )
)]
pub async fn delete_order(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<AdminKeyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    state.orders.delete_order(OrderId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Admin order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/{id}", delete(delete_order))
        .route("/admin/orders/{id}/decision", post(decide_order))
        .route("/admin/orders/{id}/ship", post(ship_order))
        .route("/admin/orders/{id}/out-for-delivery", post(out_for_delivery))
        .route("/admin/orders/{id}/deliver", post(deliver_order))
}
