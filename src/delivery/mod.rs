//! Outbound notification delivery.
//!
//! The [`Deliver`] trait is the seam between the dispatcher and the chat
//! service. [`SlackDelivery`] posts to Slack's Web API; tests use an
//! in-memory recorder.

use std::future::Future;

use thiserror::Error;

use crate::types::MessageTs;
use crate::webhooks::Notification;

pub mod slack;

pub use slack::SlackDelivery;

/// Result of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    /// Timestamp of the posted message, if the service reported one.
    pub ts: Option<MessageTs>,
}

/// Errors that can occur when delivering a notification.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No channel exists for the destination.
    #[error("no delivery channel for destination {0:?}")]
    NoChannel(String),

    /// The request did not complete.
    #[error("delivery request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered but refused the message.
    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// Posts notifications to a chat destination.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct Discard;
///
/// impl Deliver for Discard {
///     async fn deliver(&self, _: &str, _: &Notification) -> Result<Delivered, DeliveryError> {
///         Ok(Delivered { ts: None })
///     }
/// }
/// ```
pub trait Deliver {
    /// Posts `notification` to `destination`, as a reply when its
    /// `thread_ts` is set.
    fn deliver(
        &self,
        destination: &str,
        notification: &Notification,
    ) -> impl Future<Output = Result<Delivered, DeliveryError>> + Send;
}
