//! REST endpoint handlers organized by resource.

pub mod admin_order;
pub mod inventory;
pub mod order;
pub mod product;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(order::routes())
        .merge(admin_order::routes())
        .merge(product::routes())
        .merge(inventory::routes())
}
