//! Shared request guards: client identity, rate limiting, admin key.
//!
//! Guard order on admin routes follows the request pipeline: rate
//! limiter first, then the key gate, then business logic.

use std::net::SocketAddr;

use axum::http::HeaderMap;
use axum::response::AppendHeaders;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::security::{EndpointClass, RateLimitDecision};

/// Resolves the client identity for limiter and lockout keys: the
/// first `X-Forwarded-For` hop when present, otherwise the socket peer.
#[must_use]
pub fn client_id(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| peer.ip().to_string(), str::to_string)
}

/// Admin key accepted as a query parameter (the header form is also
/// supported, see [`admin_key`]).
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AdminKeyParams {
    /// Shared admin secret.
    #[serde(default)]
    pub admin_key: Option<String>,
}

/// Extracts the admin key from the `x-admin-key` header or the
/// `admin_key` query parameter, header first.
#[must_use]
pub fn admin_key(headers: &HeaderMap, params: &AdminKeyParams) -> Option<String> {
    headers
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| params.admin_key.clone())
}

/// Applies the rate limit for an unauthenticated endpoint class.
///
/// # Errors
///
/// Returns [`ApiError::RateLimited`] when the budget is exhausted.
pub async fn guard_public(
    state: &AppState,
    client: &str,
    class: EndpointClass,
) -> Result<RateLimitDecision, ApiError> {
    state.rate_limiter.check(client, class).await
}

/// Limiter headers for successful responses, matching the names the
/// throttled error path emits.
#[must_use]
pub fn rate_headers(
    decision: &RateLimitDecision,
) -> AppendHeaders<[(&'static str, String); 3]> {
    AppendHeaders([
        ("x-ratelimit-limit", decision.limit.to_string()),
        ("x-ratelimit-remaining", decision.remaining.to_string()),
        ("x-ratelimit-reset", decision.reset_at.timestamp().to_string()),
    ])
}

/// Applies the admin rate limit, then validates the admin key.
///
/// # Errors
///
/// - [`ApiError::RateLimited`] when the admin budget is exhausted.
/// - [`ApiError::LockedOut`] when the client is locked out.
/// - [`ApiError::Unauthorized`] on a bad or missing key.
pub async fn guard_admin(
    state: &AppState,
    client: &str,
    key: Option<&str>,
) -> Result<(), ApiError> {
    state.rate_limiter.check(client, EndpointClass::Admin).await?;
    state.admin_gate.validate(key, client).await
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "10.0.0.9:55000".parse().unwrap_or_else(|_| {
            panic!("valid socket addr");
        })
    }

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        assert_eq!(client_id(&headers, peer()), "1.2.3.4");
    }

    #[test]
    fn falls_back_to_peer_address() {
        assert_eq!(client_id(&HeaderMap::new(), peer()), "10.0.0.9");
    }

    #[test]
    fn header_key_wins_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert("x-admin-key", HeaderValue::from_static("from-header"));
        let params = AdminKeyParams {
            admin_key: Some("from-query".into()),
        };
        assert_eq!(admin_key(&headers, &params).as_deref(), Some("from-header"));
        assert_eq!(
            admin_key(&HeaderMap::new(), &params).as_deref(),
            Some("from-query")
        );
        assert!(admin_key(&HeaderMap::new(), &AdminKeyParams::default()).is_none());
    }
}
