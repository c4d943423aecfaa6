//! Advisory email notification dispatch.
//!
//! The lifecycle service awaits every send but treats the result as
//! advisory: a failure is logged and attached to the response payload,
//! never propagated as the request's overall error. Delivery is
//! at-most-once; there is no retry queue.

pub mod email;
pub mod messages;

use std::fmt;

use async_trait::async_trait;

use crate::error::ApiError;

pub use email::{HttpEmailNotifier, SimulatedNotifier};

/// One outbound email.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Notification`] when the channel rejects or
    /// cannot reach the provider.
    async fn send(&self, msg: &EmailMessage) -> Result<(), ApiError>;
}
