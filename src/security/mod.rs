//! Request gating: rate limiting and admin authentication.
//!
//! Both services are injected through the application state rather than
//! living as module globals, so tests get fresh state per case and a
//! future multi-instance deployment can swap in a shared store.

pub mod admin_key;
pub mod rate_limit;

pub use admin_key::AdminGate;
pub use rate_limit::{EndpointClass, RateLimitDecision, RateLimiter, RatePolicies, RatePolicy};
