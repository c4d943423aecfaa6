//! Notifier implementations: HTTP email API client and simulated no-op.

use async_trait::async_trait;
use serde::Serialize;

use super::{EmailMessage, Notifier};
use crate::error::ApiError;

/// Request body accepted by the transactional email HTTP API.
#[derive(Debug, Serialize)]
struct SendPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Sends email through a transactional HTTP email API with bearer auth.
#[derive(Debug)]
pub struct HttpEmailNotifier {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpEmailNotifier {
    /// Creates a notifier for the given API endpoint and sender address.
    #[must_use]
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Notifier for HttpEmailNotifier {
    async fn send(&self, msg: &EmailMessage) -> Result<(), ApiError> {
        let payload = SendPayload {
            from: &self.from,
            to: &msg.to,
            subject: &msg.subject,
            text: &msg.body,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ApiError::Notification(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Notification(format!(
                "email API returned {status}: {body}"
            )));
        }

        tracing::info!(to = %msg.to, subject = %msg.subject, "email sent");
        Ok(())
    }
}

/// Fallback channel when no email API is configured: logs the message
/// and reports success so lifecycle flows behave identically in
/// development.
#[derive(Debug, Default)]
pub struct SimulatedNotifier;

#[async_trait]
impl Notifier for SimulatedNotifier {
    async fn send(&self, msg: &EmailMessage) -> Result<(), ApiError> {
        tracing::info!(
            to = %msg.to,
            subject = %msg.subject,
            "email channel unconfigured; simulating send"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_send_always_succeeds() {
        let notifier = SimulatedNotifier;
        let msg = EmailMessage {
            to: "ada@example.com".into(),
            subject: "Order received".into(),
            body: "Thanks!".into(),
        };
        assert!(notifier.send(&msg).await.is_ok());
    }
}
