//! Product catalog handlers, public and admin.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::{CatalogParams, ProductListResponse};
use crate::api::guard::{self, AdminKeyParams};
use crate::app_state::AppState;
use crate::domain::{Product, ProductId, ProductPatch};
use crate::error::{ApiError, ErrorResponse};
use crate::security::EndpointClass;
use crate::service::NewProduct;

/// `GET /products` — Public catalog listing.
///
/// # Errors
///
/// Returns [`ApiError::RateLimited`] when the public budget is
/// exhausted.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "Products",
    summary = "List products",
    description = "Returns active products. `search` matches name and description case-insensitively and takes precedence over `category`.",
    params(CatalogParams),
    responses(
        (status = 200, description = "Active products", body = ProductListResponse),
        (status = 429, description = "Public budget exhausted", body = ErrorResponse),
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<CatalogParams>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let decision = guard::guard_public(&state, &client, EndpointClass::Public).await?;

    let products = state
        .catalog
        .list_public(params.category.as_deref(), params.search.as_deref())
        .await?;
    Ok((
        guard::rate_headers(&decision),
        Json(ProductListResponse::from(products)),
    ))
}

/// `GET /products/{id}` — Public product detail.
///
/// # Errors
///
/// Returns [`ApiError::ProductNotFound`] for missing or inactive
/// products.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    tag = "Products",
    summary = "Get a product",
    description = "Returns one active product. Inactive products are indistinguishable from missing ones.",
    params(
        ("id" = uuid::Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product detail", body = Product),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 429, description = "Public budget exhausted", body = ErrorResponse),
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let decision = guard::guard_public(&state, &client, EndpointClass::Public).await?;

    let product = state
        .catalog
        .get_public_product(ProductId::from_uuid(id))
        .await?;
    Ok((guard::rate_headers(&decision), Json(product)))
}

/// `GET /admin/products` — Full catalog including inactive products.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] on a bad key.
#[utoipa::path(
    get,
    path = "/api/v1/admin/products",
    tag = "Admin Products",
    summary = "List all products",
    description = "Returns every product, inactive ones included.",
    params(AdminKeyParams),
    responses(
        (status = 200, description = "All products", body = ProductListResponse),
        (status = 401, description = "Bad or missing admin key", body = ErrorResponse),
    )
)]
pub async fn admin_list_products(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<AdminKeyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    let products = state.catalog.list_admin().await?;
    Ok(Json(ProductListResponse::from(products)))
}

/// `POST /admin/products` — Create a product.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] on an empty name, non-positive
/// price, or empty category.
#[utoipa::path(
    post,
    path = "/api/v1/admin/products",
    tag = "Admin Products",
    summary = "Create a product",
    description = "Creates an active product. The image URL points at an already-uploaded asset.",
    params(AdminKeyParams),
    request_body = NewProduct,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Bad or missing admin key", body = ErrorResponse),
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<AdminKeyParams>,
    Json(req): Json<NewProduct>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    let product = state.catalog.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /admin/products/{id}` — Partial product update.
///
/// # Errors
///
/// Returns [`ApiError::ProductNotFound`] when the product does not
/// exist, or [`ApiError::Validation`] on an invalid patch.
#[utoipa::path(
    put,
    path = "/api/v1/admin/products/{id}",
    tag = "Admin Products",
    summary = "Update a product",
    description = "Applies the present fields of the patch and bumps the update timestamp. Absent fields are untouched.",
    params(
        ("id" = uuid::Uuid, Path, description = "Product UUID"),
        AdminKeyParams,
    ),
    request_body = ProductPatch,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Invalid patch", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<AdminKeyParams>,
    Json(patch): Json<ProductPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    let product = state
        .catalog
        .update_product(ProductId::from_uuid(id), patch)
        .await?;
    Ok(Json(product))
}

/// `DELETE /admin/products/{id}` — Remove a product.
///
/// # Errors
///
/// Returns [`ApiError::ProductNotFound`] when the product does not
/// exist.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/products/{id}",
    tag = "Admin Products",
    summary = "Delete a product",
    description = "Hard-deletes a product. Existing orders keep their denormalized line-item snapshot.",
    params(
        ("id" = uuid::Uuid, Path, description = "Product UUID"),
        AdminKeyParams,
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = ErrorResponse),
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<AdminKeyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let client = guard::client_id(&headers, peer);
    let key = guard::admin_key(&headers, &params);
    guard::guard_admin(&state, &client, key.as_deref()).await?;

    state.catalog.delete_product(ProductId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Product routes, public and admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route(
            "/admin/products",
            get(admin_list_products).post(create_product),
        )
        .route(
            "/admin/products/{id}",
            put(update_product).delete(delete_product),
        )
}
