//! Fixed-window request rate limiter.
//!
//! [`RateLimiter`] keeps one `{count, reset_at}` window per
//! `(client, endpoint class)` key in a mutex-guarded map. It is an
//! injected service held by the application state, not a global, so
//! tests can build a fresh limiter per case. Counters are process-local:
//! they reset on restart and are not shared across horizontally scaled
//! instances.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::error::ApiError;

/// Expired-entry sweep runs once every this many checks.
const SWEEP_INTERVAL: u64 = 128;

/// Endpoint classes with independent request budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    /// General public API reads.
    Public,
    /// Admin key validation attempts.
    Auth,
    /// Image/file uploads.
    Upload,
    /// Order placement.
    PlaceOrder,
    /// Authenticated admin actions.
    Admin,
}

impl EndpointClass {
    /// Stable key fragment for the window map.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Auth => "auth",
            Self::Upload => "upload",
            Self::PlaceOrder => "place_order",
            Self::Admin => "admin",
        }
    }
}

/// Budget for one endpoint class: `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicy {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

/// Per-class budgets. Values are configuration; the shape (independent
/// budgets per class) is the contract.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicies {
    /// Budget for [`EndpointClass::Public`].
    pub public: RatePolicy,
    /// Budget for [`EndpointClass::Auth`].
    pub auth: RatePolicy,
    /// Budget for [`EndpointClass::Upload`].
    pub upload: RatePolicy,
    /// Budget for [`EndpointClass::PlaceOrder`].
    pub place_order: RatePolicy,
    /// Budget for [`EndpointClass::Admin`].
    pub admin: RatePolicy,
}

impl RatePolicies {
    /// Returns the budget for the given class.
    #[must_use]
    pub const fn for_class(&self, class: EndpointClass) -> RatePolicy {
        match class {
            EndpointClass::Public => self.public,
            EndpointClass::Auth => self.auth,
            EndpointClass::Upload => self.upload,
            EndpointClass::PlaceOrder => self.place_order,
            EndpointClass::Admin => self.admin,
        }
    }
}

impl Default for RatePolicies {
    fn default() -> Self {
        Self {
            public: RatePolicy {
                max_requests: 100,
                window_secs: 15 * 60,
            },
            auth: RatePolicy {
                max_requests: 5,
                window_secs: 15 * 60,
            },
            upload: RatePolicy {
                max_requests: 10,
                window_secs: 60,
            },
            place_order: RatePolicy {
                max_requests: 5,
                window_secs: 10 * 60,
            },
            admin: RatePolicy {
                max_requests: 20,
                window_secs: 5 * 60,
            },
        }
    }
}

/// Outcome of an allowed rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Configured budget for the window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Instant at which the window resets.
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug)]
struct WindowEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Fixed-window rate limiter keyed by `(client, endpoint class)`.
#[derive(Debug)]
pub struct RateLimiter {
    policies: RatePolicies,
    windows: Mutex<HashMap<String, WindowEntry>>,
    checks: AtomicU64,
}

impl RateLimiter {
    /// Creates a limiter with the given per-class budgets.
    #[must_use]
    pub fn new(policies: RatePolicies) -> Self {
        Self {
            policies,
            windows: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    /// Records a request from `client_id` against `class`.
    ///
    /// First request for a key, or a request after the window expired,
    /// starts a fresh window with `count = 1`. Otherwise the counter is
    /// incremented and the request is allowed iff it fits the budget.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::RateLimited`] when the budget is exhausted.
    pub async fn check(
        &self,
        client_id: &str,
        class: EndpointClass,
    ) -> Result<RateLimitDecision, ApiError> {
        self.check_at(client_id, class, Utc::now()).await
    }

    async fn check_at(
        &self,
        client_id: &str,
        class: EndpointClass,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, ApiError> {
        let policy = self.policies.for_class(class);
        let key = format!("{client_id}:{}", class.name());
        let mut windows = self.windows.lock().await;

        // Best-effort cleanup: expired keys otherwise accumulate for
        // the lifetime of the process.
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == 0 {
            windows.retain(|_, entry| entry.reset_at > now);
        }

        let entry = windows.entry(key).or_insert(WindowEntry {
            count: 0,
            reset_at: now + Duration::seconds(window_secs_i64(policy)),
        });
        if entry.reset_at <= now {
            entry.count = 0;
            entry.reset_at = now + Duration::seconds(window_secs_i64(policy));
        }
        entry.count = entry.count.saturating_add(1);

        if entry.count > policy.max_requests {
            let retry_after_secs = (entry.reset_at - now).num_seconds().max(0) as u64;
            return Err(ApiError::RateLimited {
                limit: policy.max_requests,
                retry_after_secs,
                reset_at: entry.reset_at,
            });
        }

        Ok(RateLimitDecision {
            limit: policy.max_requests,
            remaining: policy.max_requests - entry.count,
            reset_at: entry.reset_at,
        })
    }

    /// Number of live window entries. Test and diagnostics hook.
    pub async fn window_count(&self) -> usize {
        self.windows.lock().await.len()
    }
}

fn window_secs_i64(policy: RatePolicy) -> i64 {
    i64::try_from(policy.window_secs).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn tight_policies(max_requests: u32, window_secs: u64) -> RatePolicies {
        let policy = RatePolicy {
            max_requests,
            window_secs,
        };
        RatePolicies {
            public: policy,
            auth: policy,
            upload: policy,
            place_order: policy,
            admin: policy,
        }
    }

    #[tokio::test]
    async fn allows_up_to_budget_then_rejects() {
        let limiter = RateLimiter::new(tight_policies(3, 60));
        let now = Utc::now();

        for expected_remaining in [2u32, 1, 0] {
            let decision = limiter.check_at("1.2.3.4", EndpointClass::Public, now).await;
            let Ok(decision) = decision else {
                panic!("expected allowed check");
            };
            assert_eq!(decision.remaining, expected_remaining);
            assert_eq!(decision.limit, 3);
        }

        let rejected = limiter.check_at("1.2.3.4", EndpointClass::Public, now).await;
        let Err(ApiError::RateLimited { limit, .. }) = rejected else {
            panic!("expected rate limit rejection");
        };
        assert_eq!(limit, 3);
    }

    #[tokio::test]
    async fn window_expiry_starts_fresh_counter() {
        let limiter = RateLimiter::new(tight_policies(1, 60));
        let now = Utc::now();

        assert!(limiter.check_at("c", EndpointClass::Public, now).await.is_ok());
        assert!(limiter.check_at("c", EndpointClass::Public, now).await.is_err());

        let later = now + Duration::seconds(61);
        let decision = limiter.check_at("c", EndpointClass::Public, later).await;
        let Ok(decision) = decision else {
            panic!("expected fresh window after expiry");
        };
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn budgets_are_independent_per_class_and_client() {
        let limiter = RateLimiter::new(tight_policies(1, 60));
        let now = Utc::now();

        assert!(limiter.check_at("a", EndpointClass::Public, now).await.is_ok());
        assert!(limiter.check_at("a", EndpointClass::Public, now).await.is_err());

        // Same client, different class: separate window.
        assert!(limiter.check_at("a", EndpointClass::Admin, now).await.is_ok());
        // Different client, same class: separate window.
        assert!(limiter.check_at("b", EndpointClass::Public, now).await.is_ok());
    }

    #[tokio::test]
    async fn sweep_drops_expired_entries() {
        let limiter = RateLimiter::new(tight_policies(10, 1));
        let now = Utc::now();

        for i in 0..5 {
            let client = format!("client-{i}");
            let _ = limiter.check_at(&client, EndpointClass::Public, now).await;
        }
        assert_eq!(limiter.window_count().await, 5);

        // Drive the counter past the sweep interval with checks whose
        // windows are already expired relative to `later`.
        let later = now + Duration::seconds(120);
        for i in 0..(SWEEP_INTERVAL + 1) {
            let client = format!("late-{i}");
            let _ = limiter.check_at(&client, EndpointClass::Public, later).await;
        }
        // The five original windows expired and at least one sweep ran.
        let count = limiter.window_count().await;
        assert!(count <= (SWEEP_INTERVAL + 1) as usize);
        for i in 0..5 {
            let client = format!("client-{i}");
            let decision = limiter.check_at(&client, EndpointClass::Public, later).await;
            assert!(decision.is_ok());
        }
    }
}
