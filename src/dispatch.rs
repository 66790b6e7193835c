//! Notification dispatcher.
//!
//! Per inbound webhook:
//!
//! 1. verify the signature (reject with 401)
//! 2. require a destination room (reject with 400)
//! 3. require an event type (reject with 400)
//! 4. classify; events that produce no notification end here
//! 5. resolve the thread key
//! 6. reply into the existing thread, if one is recorded
//! 7. deliver
//! 8. record the new message as the thread origin if it started the thread
//!
//! Only steps 1-3 can fail the request. From step 4 on every problem is
//! logged with the payload and the caller gets a plain acknowledgement, so
//! GitHub never redelivers because of an internal fault.

use std::fmt;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::delivery::{Deliver, DeliveryError};
use crate::threads::{CommitSearch, ThreadKeyResolver, ThreadRegistry};
use crate::types::{MessageTs, ThreadKey};
use crate::webhooks::{EventType, InboundEvent, Verification, classify, verify};

/// Response body for a request without a signature header.
pub const MSG_MISSING_SIGNATURE: &str = "ERROR: GitHub Secret not set. Rejecting request!";
/// Response body for a request whose signature cannot be accepted.
pub const MSG_INVALID_SIGNATURE: &str = "ERROR: GitHub Secret invalid. Rejecting request!";
/// Response body for a request without a `room` parameter.
pub const MSG_MISSING_ROOM: &str =
    "ERROR: No room was defined. Please pass the parameter \"room\"!";
/// Response body for a request without an `X-GitHub-Event` header.
pub const MSG_MISSING_EVENT_TYPE: &str =
    "ERROR: No event type was defined. Please send the \"X-GitHub-Event\" header!";

/// Reasons a webhook request is refused before any processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectError {
    /// The request carried no signature header.
    #[error("{}", MSG_MISSING_SIGNATURE)]
    MissingSignature,

    /// No webhook secret is configured on this relay.
    #[error("{}", MSG_INVALID_SIGNATURE)]
    SecretNotConfigured,

    /// The signature does not match the body.
    #[error("{}", MSG_INVALID_SIGNATURE)]
    InvalidSignature,

    /// No destination room was given.
    #[error("{}", MSG_MISSING_ROOM)]
    MissingRoom,

    /// No event type header was given.
    #[error("{}", MSG_MISSING_EVENT_TYPE)]
    MissingEventType,
}

impl RejectError {
    /// True for authentication failures (401), false for bad requests (400).
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            RejectError::MissingSignature
                | RejectError::SecretNotConfigured
                | RejectError::InvalidSignature
        )
    }
}

/// The parts of an HTTP request the dispatcher looks at.
#[derive(Debug, Clone, Copy)]
pub struct WebhookRequest<'a> {
    pub signature: Option<&'a str>,
    pub event_type: Option<&'a str>,
    pub room: Option<&'a str>,
    pub body: &'a [u8],
}

/// What happened to an accepted webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The event does not produce a notification.
    Ignored,
    /// The body is not a JSON document.
    Malformed,
    /// The notification was posted.
    Delivered {
        thread_key: Option<ThreadKey>,
        /// Origin the notification replied to, if the thread existed.
        reply_to: Option<MessageTs>,
        /// Timestamp of the posted message.
        ts: Option<MessageTs>,
        /// Whether this message was recorded as a new thread origin.
        started_thread: bool,
    },
    /// The chat service did not accept the notification.
    DeliveryFailed,
}

/// Orchestrates verification, classification, threading and delivery.
pub struct Dispatcher<S, R, D> {
    secret: Option<Vec<u8>>,
    debug_payloads: bool,
    resolver: ThreadKeyResolver<S>,
    registry: R,
    delivery: D,
}

impl<S, R, D> fmt::Debug for Dispatcher<S, R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("secret_configured", &self.secret.is_some())
            .field("debug_payloads", &self.debug_payloads)
            .finish_non_exhaustive()
    }
}

impl<S, R, D> Dispatcher<S, R, D>
where
    S: CommitSearch + Send + Sync,
    R: ThreadRegistry,
    D: Deliver + Send + Sync,
{
    /// Creates a dispatcher. `secret` is `None` when no webhook secret is
    /// configured; every request is then refused.
    pub fn new(
        secret: Option<Vec<u8>>,
        resolver: ThreadKeyResolver<S>,
        registry: R,
        delivery: D,
    ) -> Self {
        Self {
            secret,
            debug_payloads: false,
            resolver,
            registry,
            delivery,
        }
    }

    /// Logs the full payload of events that produce no notification.
    pub fn with_debug_payloads(mut self, enabled: bool) -> Self {
        self.debug_payloads = enabled;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Handles one webhook request end to end.
    ///
    /// Returns `Err` only for requests refused before processing; any later
    /// problem is logged and reported through the [`RelayOutcome`].
    pub async fn handle(&self, request: WebhookRequest<'_>) -> Result<RelayOutcome, RejectError> {
        let (room, event_type) = self.accept(&request)?;

        let event = match InboundEvent::parse(event_type, request.body.to_vec()) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    error = %e,
                    payload = %String::from_utf8_lossy(request.body),
                    "Webhook body is not valid JSON"
                );
                return Ok(RelayOutcome::Malformed);
            }
        };

        Ok(self.relay(room, &event).await)
    }

    /// Steps 1-3: checks that decide the HTTP status.
    fn accept<'a>(&self, request: &WebhookRequest<'a>) -> Result<(&'a str, EventType), RejectError> {
        match verify(self.secret.as_deref(), request.signature, request.body) {
            Verification::Valid => {}
            Verification::SecretNotConfigured => {
                error!("Webhook secret not configured, rejecting request");
                return Err(RejectError::SecretNotConfigured);
            }
            Verification::MissingSignature => {
                warn!("Webhook request without signature header");
                return Err(RejectError::MissingSignature);
            }
            Verification::Mismatch => {
                warn!("Invalid webhook signature");
                return Err(RejectError::InvalidSignature);
            }
        }

        let Some(room) = request.room.filter(|r| !r.is_empty()) else {
            warn!("Webhook request without room parameter");
            return Err(RejectError::MissingRoom);
        };

        let Some(event_type) = request.event_type.filter(|e| !e.is_empty()) else {
            warn!(room = %room, "Webhook request without event type header");
            return Err(RejectError::MissingEventType);
        };

        Ok((room, EventType::from_header(event_type)))
    }

    /// Steps 4-8 for an accepted event. Never fails.
    pub async fn relay(&self, room: &str, event: &InboundEvent) -> RelayOutcome {
        let Some(notification) = classify(&event.event_type, &event.payload) else {
            if self.debug_payloads {
                info!(
                    event_type = %event.event_type,
                    payload = %event.body_lossy(),
                    "Ignoring webhook event"
                );
            } else {
                debug!(event_type = %event.event_type, "Ignoring webhook event");
            }
            return RelayOutcome::Ignored;
        };

        let thread_key = self.resolver.resolve(&event.payload).await;
        let reply_to = thread_key.as_ref().and_then(|key| self.registry.get(key));

        let notification = match &reply_to {
            Some(ts) => notification.reply_to(ts.clone()),
            None => notification,
        };

        let delivered = match self.delivery.deliver(room, &notification).await {
            Ok(delivered) => delivered,
            Err(e) => {
                self.log_delivery_failure(room, event, &e);
                return RelayOutcome::DeliveryFailed;
            }
        };

        let started_thread = match (&thread_key, &reply_to, &delivered.ts) {
            (Some(key), None, Some(ts)) => self.record_origin(key, ts).await,
            _ => false,
        };

        info!(
            room = %room,
            event_type = %event.event_type,
            thread_key = ?thread_key.as_ref().map(ThreadKey::as_str),
            reply = reply_to.is_some(),
            started_thread,
            "Relayed webhook event"
        );

        RelayOutcome::Delivered {
            thread_key,
            reply_to,
            ts: delivered.ts,
            started_thread,
        }
    }

    async fn record_origin(&self, key: &ThreadKey, ts: &MessageTs) -> bool {
        match self.registry.set_if_absent(key, ts.clone()).await {
            Ok(true) => true,
            Ok(false) => {
                // A concurrent event for the same new thread recorded first;
                // this message stays a top-level post.
                info!(thread_key = %key, ts = %ts, "Thread origin already recorded");
                false
            }
            Err(e) => {
                error!(thread_key = %key, ts = %ts, error = %e, "Failed to record thread origin");
                false
            }
        }
    }

    fn log_delivery_failure(&self, room: &str, event: &InboundEvent, e: &DeliveryError) {
        match e {
            DeliveryError::NoChannel(_) => error!(
                room = %room,
                event_type = %event.event_type,
                error = %e,
                "No chat channel for room; was the chat integration set up?"
            ),
            _ => error!(
                room = %room,
                event_type = %event.event_type,
                error = %e,
                payload = %event.body_lossy(),
                "Failed to deliver notification"
            ),
        }
    }
}
