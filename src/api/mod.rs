//! REST API layer: route handlers, DTOs, guards, and router composition.
//!
//! All storefront and admin endpoints are mounted under `/api/v1`;
//! `/health` lives at the root.

pub mod dto;
pub mod guard;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}
