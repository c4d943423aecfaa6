//! Admin shared-secret gate with brute-force lockout.
//!
//! [`AdminGate`] validates the admin API key with a constant-time byte
//! comparison and tracks failed attempts per client address. Five
//! consecutive failures lock the client out for fifteen minutes, even
//! for subsequent correct keys. Attempt counters are process-local and
//! reset on restart.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::error::ApiError;

/// Failed attempts allowed before the lockout engages.
const MAX_ATTEMPTS: u32 = 5;

/// Lockout window in seconds.
const LOCKOUT_SECS: i64 = 15 * 60;

#[derive(Debug)]
struct AttemptEntry {
    count: u32,
    last_attempt_at: DateTime<Utc>,
}

/// Shared-secret authentication gate for admin endpoints.
#[derive(Debug)]
pub struct AdminGate {
    secret: String,
    attempts: Mutex<HashMap<String, AttemptEntry>>,
}

impl AdminGate {
    /// Creates a gate around the configured admin secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Validates `provided` for the given client.
    ///
    /// A missing key is treated as a mismatch and still consumes a
    /// lockout slot, so empty-key probing cannot enumerate freely.
    ///
    /// # Errors
    ///
    /// - [`ApiError::LockedOut`] when the client has exhausted its
    ///   attempts inside the lockout window. The key is not compared.
    /// - [`ApiError::Unauthorized`] on mismatch.
    pub async fn validate(&self, provided: Option<&str>, client_id: &str) -> Result<(), ApiError> {
        self.validate_at(provided, client_id, Utc::now()).await
    }

    async fn validate_at(
        &self,
        provided: Option<&str>,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let mut attempts = self.attempts.lock().await;

        if let Some(entry) = attempts.get(client_id) {
            let elapsed = now - entry.last_attempt_at;
            if entry.count >= MAX_ATTEMPTS {
                if elapsed < Duration::seconds(LOCKOUT_SECS) {
                    let retry_after_secs =
                        (Duration::seconds(LOCKOUT_SECS) - elapsed).num_seconds().max(0) as u64;
                    return Err(ApiError::LockedOut { retry_after_secs });
                }
                // Lockout window elapsed; forget the record.
                attempts.remove(client_id);
            }
        }

        let provided = provided.unwrap_or("");
        if constant_time_eq(provided.as_bytes(), self.secret.as_bytes()) {
            // Successful auth resets the counter.
            attempts.remove(client_id);
            return Ok(());
        }

        let entry = attempts
            .entry(client_id.to_string())
            .or_insert(AttemptEntry {
                count: 0,
                last_attempt_at: now,
            });
        entry.count = entry.count.saturating_add(1);
        entry.last_attempt_at = now;
        tracing::warn!(client = client_id, failures = entry.count, "admin key mismatch");

        Err(ApiError::Unauthorized)
    }

    /// Number of clients with live attempt records. Test hook.
    pub async fn tracked_clients(&self) -> usize {
        self.attempts.lock().await.len()
    }
}

/// Constant-time byte comparison.
///
/// Folds the length difference and every byte XOR into one accumulator
/// so the running time does not depend on where the first mismatch
/// occurs. No constant-time crate is pulled in for eleven lines.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut diff = a.len() ^ b.len();
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const SECRET: &str = "super-secret-admin-key";
    const CLIENT: &str = "1.2.3.4";

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"", b"abc"));
        assert!(constant_time_eq(b"", b""));
    }

    #[tokio::test]
    async fn correct_key_succeeds() {
        let gate = AdminGate::new(SECRET);
        let result = gate.validate(Some(SECRET), CLIENT).await;
        assert!(result.is_ok());
        assert_eq!(gate.tracked_clients().await, 0);
    }

    #[tokio::test]
    async fn wrong_key_is_unauthorized() {
        let gate = AdminGate::new(SECRET);
        let result = gate.validate(Some("nope"), CLIENT).await;
        let Err(ApiError::Unauthorized) = result else {
            panic!("expected unauthorized");
        };
    }

    #[tokio::test]
    async fn missing_key_consumes_a_slot() {
        let gate = AdminGate::new(SECRET);
        let result = gate.validate(None, CLIENT).await;
        assert!(result.is_err());
        assert_eq!(gate.tracked_clients().await, 1);
    }

    #[tokio::test]
    async fn five_failures_lock_out_even_the_correct_key() {
        let gate = AdminGate::new(SECRET);
        let now = Utc::now();

        for _ in 0..5 {
            let result = gate.validate_at(Some("wrong"), CLIENT, now).await;
            let Err(ApiError::Unauthorized) = result else {
                panic!("expected unauthorized before lockout");
            };
        }

        let locked = gate.validate_at(Some(SECRET), CLIENT, now).await;
        let Err(ApiError::LockedOut { retry_after_secs }) = locked else {
            panic!("expected lockout for correct key inside the window");
        };
        assert!(retry_after_secs <= LOCKOUT_SECS as u64);
    }

    #[tokio::test]
    async fn lockout_expires_after_the_window() {
        let gate = AdminGate::new(SECRET);
        let now = Utc::now();

        for _ in 0..5 {
            let _ = gate.validate_at(Some("wrong"), CLIENT, now).await;
        }

        let later = now + Duration::seconds(LOCKOUT_SECS + 1);
        let result = gate.validate_at(Some(SECRET), CLIENT, later).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn success_before_fifth_failure_clears_the_counter() {
        let gate = AdminGate::new(SECRET);
        let now = Utc::now();

        for _ in 0..4 {
            let _ = gate.validate_at(Some("wrong"), CLIENT, now).await;
        }
        assert!(gate.validate_at(Some(SECRET), CLIENT, now).await.is_ok());
        assert_eq!(gate.tracked_clients().await, 0);

        // Fresh budget afterwards.
        let result = gate.validate_at(Some("wrong"), CLIENT, now).await;
        let Err(ApiError::Unauthorized) = result else {
            panic!("expected plain unauthorized, not lockout");
        };
    }

    #[tokio::test]
    async fn lockout_is_per_client() {
        let gate = AdminGate::new(SECRET);
        let now = Utc::now();

        for _ in 0..5 {
            let _ = gate.validate_at(Some("wrong"), "1.1.1.1", now).await;
        }
        // Other clients are unaffected.
        assert!(gate.validate_at(Some(SECRET), "2.2.2.2", now).await.is_ok());
    }
}
