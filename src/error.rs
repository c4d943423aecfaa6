//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the central error type for the storefront backend.
//! Each variant maps to a specific HTTP status code and structured JSON
//! error response.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{OrderId, OrderStatus, ProductId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "insufficient stock for 1 item(s)",
///     "details": [{"product_id": "...", "requested": 3, "available": 2}]
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`ApiError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details (field errors, stock shortages).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// One line item the store could not fulfil.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockShortage {
    /// Product that is short.
    pub product_id: ProductId,
    /// Product name snapshot from the request.
    pub name: String,
    /// Quantity the customer asked for.
    pub requested: u32,
    /// Quantity actually available.
    pub available: u32,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                |
/// |-----------|-------------------|----------------------------|
/// | 1000–1999 | Validation / Auth | 400 / 401                  |
/// | 2000–2999 | Not Found / State | 404 / 409                  |
/// | 3000–3999 | Server            | 500 Internal Server Error  |
/// | 4000–4999 | Domain (stock)    | 422 Unprocessable Entity   |
/// | 4290–4299 | Throttling        | 429 Too Many Requests      |
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request validation failed; every failing field is listed.
    #[error("validation failed: {}", errors.join("; "))]
    Validation {
        /// All field-level validation messages, not just the first.
        errors: Vec<String>,
    },

    /// Admin key missing or wrong. Never reveals how close the key was.
    #[error("invalid admin key")]
    Unauthorized,

    /// Too many failed admin key attempts from this client.
    #[error("too many failed attempts; retry after {retry_after_secs} s")]
    LockedOut {
        /// Seconds until the lockout window expires.
        retry_after_secs: u64,
    },

    /// Client exceeded the fixed-window rate limit for this endpoint class.
    #[error("rate limit exceeded; retry after {retry_after_secs} s")]
    RateLimited {
        /// Configured request budget for the window.
        limit: u32,
        /// Seconds until the window resets.
        retry_after_secs: u64,
        /// Instant at which the window resets.
        reset_at: DateTime<Utc>,
    },

    /// Order with the given ID was not found.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Product with the given ID was not found.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The requested status change is not allowed from the current status.
    #[error("cannot transition order from {from} to {to}")]
    InvalidTransition {
        /// Current order status.
        from: OrderStatus,
        /// Requested order status.
        to: OrderStatus,
    },

    /// One or more line items exceed available stock.
    #[error("insufficient stock for {} item(s)", .0.len())]
    InsufficientStock(Vec<StockShortage>),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Notification channel failure. Advisory only: lifecycle transitions
    /// catch this and report it in the response payload instead of failing.
    #[error("notification error: {0}")]
    Notification(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Builds a validation error from a list of field messages.
    #[must_use]
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation { .. } => 1001,
            Self::Unauthorized => 1101,
            Self::OrderNotFound(_) => 2001,
            Self::ProductNotFound(_) => 2002,
            Self::InvalidTransition { .. } => 2101,
            Self::InsufficientStock(_) => 4001,
            Self::RateLimited { .. } => 4290,
            Self::LockedOut { .. } => 4291,
            Self::Persistence(_) => 3001,
            Self::Notification(_) => 3002,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::OrderNotFound(_) | Self::ProductNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RateLimited { .. } | Self::LockedOut { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Persistence(_) | Self::Notification(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Structured details for the error body, when the variant carries any.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation { errors } => serde_json::to_value(errors).ok(),
            Self::InsufficientStock(shortages) => serde_json::to_value(shortages).ok(),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;

        // Throttling responses carry the standard limiter headers.
        match self {
            Self::RateLimited {
                limit,
                retry_after_secs,
                reset_at,
            } => {
                let headers = response.headers_mut();
                insert_header(headers, "x-ratelimit-limit", &limit.to_string());
                insert_header(headers, "x-ratelimit-remaining", "0");
                insert_header(headers, "x-ratelimit-reset", &reset_at.timestamp().to_string());
                insert_header(headers, "retry-after", &retry_after_secs.to_string());
            }
            Self::LockedOut { retry_after_secs } => {
                let headers = response.headers_mut();
                insert_header(headers, "retry-after", &retry_after_secs.to_string());
            }
            _ => {}
        }

        response
    }
}

/// Inserts a header, skipping it if the value cannot be encoded.
fn insert_header(headers: &mut axum::http::HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::OrderId;

    #[test]
    fn validation_lists_every_error() {
        let err = ApiError::validation(vec!["name is required".into(), "email is invalid".into()]);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("name is required"));
        assert!(err.to_string().contains("email is invalid"));
    }

    #[test]
    fn lockout_and_rate_limit_are_distinguishable() {
        let locked = ApiError::LockedOut {
            retry_after_secs: 900,
        };
        let limited = ApiError::RateLimited {
            limit: 5,
            retry_after_secs: 60,
            reset_at: Utc::now(),
        };
        assert_eq!(locked.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_ne!(locked.error_code(), limited.error_code());
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError::OrderNotFound(OrderId::new());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
    }

    #[test]
    fn shortage_details_are_structured() {
        let err = ApiError::InsufficientStock(vec![StockShortage {
            product_id: crate::domain::ProductId::new(),
            name: "Ring A".into(),
            requested: 3,
            available: 2,
        }]);
        let details = err.details();
        let Some(details) = details else {
            panic!("expected shortage details");
        };
        let Some(first) = details.as_array().and_then(|a| a.first()) else {
            panic!("expected one shortage entry");
        };
        assert_eq!(first.get("requested").and_then(|v| v.as_u64()), Some(3));
        assert_eq!(first.get("available").and_then(|v| v.as_u64()), Some(2));
    }
}
