//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA1 / HMAC-SHA256)
//! - Event types and lenient payload parsing
//! - Classification of events into chat notifications

pub mod classify;
pub mod events;
pub mod notification;
pub mod signature;

pub use classify::classify;
pub use events::{EventType, InboundEvent, WebhookPayload};
pub use notification::Notification;
pub use signature::{
    SignatureAlgorithm, Verification, compute_signature, format_signature_header,
    parse_signature_header, verify, verify_signature,
};
