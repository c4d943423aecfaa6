//! Admin inventory handlers: stock mutation and the low-stock report.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::{ProductListResponse, StockResponse, StockUpdateRequest};
use crate::api::guard::{self, AdminKeyParams};
use crate::app_state::AppState;
use crate::domain::ProductId;
use crate::error::{ApiError, ErrorResponse};

/// `PUT /admin/inventory/{id}` — Set or decrement stock.
///
/// # Errors
///
/// - [`ApiError::Validation`] unless exactly one of `set` / `decrease`
///   is present.
/// - [`ApiError::InsufficientStock`] when a decrement would go below
///   zero.
#[utoipa::path(
    put,
    path = "/api/v1/admin/inventory/{id}",
    tag = "Inventory",
    summary = "Mutate product stock",
    description = "Sets stock to an absolute value or decrements it. A decrement that would drop below zero fails and leaves the stock unchanged.",
    params(
        ("id" = uuid::Uuid, Path, description = "Product UUID"),
        AdminKeyParams,
    ),
    request_body = StockUpdateRequest,
    responses(
        (status = 200, description = "Stock updated", body = StockResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 422, description = "Not enough stock to decrement", body = ErrorResponse),
    )
)]
pub async fn update_stock(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<AdminKeyParams>,
    Json(req): Json<StockUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    let id = ProductId::from_uuid(id);
    let product = match (req.set, req.decrease) {
        (Some(stock), None) => state.catalog.set_stock(id, stock).await?,
        (None, Some(quantity)) => state.catalog.decrease_stock(id, quantity).await?,
        _ => {
            return Err(ApiError::validation(vec![
                "exactly one of `set` or `decrease` is required".to_string(),
            ]));
        }
    };
    Ok(Json(StockResponse::from(product)))
}

/// `GET /admin/inventory/low-stock` — Products at or below threshold.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] on a bad key.
#[utoipa::path(
    get,
    path = "/api/v1/admin/inventory/low-stock",
    tag = "Inventory",
    summary = "Low-stock report",
    description = "Returns products whose stock is at or below their per-product threshold.",
    params(AdminKeyParams),
    responses(
        (status = 200, description = "Low-stock products", body = ProductListResponse),
        (status = 401, description = "Bad or missing admin key", body = ErrorResponse),
    )
)]
pub async fn low_stock(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<AdminKeyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    let products = state.catalog.low_stock_report().await?;
    Ok(Json(ProductListResponse::from(products)))
}

/// Inventory routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/inventory/{id}", put(update_stock))
        .route("/admin/inventory/low-stock", get(low_stock))
}
