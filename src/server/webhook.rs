//! Webhook endpoint handler.
//!
//! Verifies and relays GitHub webhook deliveries inline. Once a request gets
//! past signature, room and event type checks it is always answered with an
//! empty 200, whatever happens to the notification afterwards.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::debug;

use super::AppState;
use crate::delivery::Deliver;
use crate::dispatch::{RejectError, WebhookRequest};
use crate::threads::{CommitSearch, ThreadRegistry};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for the HMAC-SHA1 signature. Preferred when both are sent.
const HEADER_SIGNATURE: &str = "x-hub-signature";
/// Header name for the HMAC-SHA256 signature.
const HEADER_SIGNATURE_256: &str = "x-hub-signature-256";

/// Query parameters of the webhook endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookParams {
    /// Chat channel the notifications go to.
    pub room: Option<String>,
}

impl IntoResponse for RejectError {
    fn into_response(self) -> Response {
        let status = if self.is_unauthorized() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::BAD_REQUEST
        };

        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Query: `room`, the destination channel
/// - Headers:
///   - `X-GitHub-Event`: Event type (e.g., "pull_request", "status")
///   - `X-Hub-Signature` or `X-Hub-Signature-256`: HMAC of the raw body
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK, empty body: request accepted
/// - 401 Unauthorized: missing or invalid signature, or no secret configured
/// - 400 Bad Request: missing room or event type
///
/// # Example
///
/// ```ignore
/// POST /hubot/gh-pull-requests?room=dev HTTP/1.1
/// X-GitHub-Event: pull_request
/// X-Hub-Signature: sha1=...
/// Content-Type: application/json
///
/// {"action": "opened", "pull_request": {...}}
///
/// HTTP/1.1 200 OK
/// ```
pub async fn webhook_handler<S, R, D>(
    State(app_state): State<AppState<S, R, D>>,
    Query(params): Query<WebhookParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, RejectError>
where
    S: CommitSearch + Send + Sync + 'static,
    R: ThreadRegistry + 'static,
    D: Deliver + Send + Sync + 'static,
{
    let event_type = get_header(&headers, HEADER_EVENT);
    let signature = get_header(&headers, HEADER_SIGNATURE)
        .or_else(|| get_header(&headers, HEADER_SIGNATURE_256));

    debug!(
        event_type = ?event_type,
        room = ?params.room,
        bytes = body.len(),
        "Received webhook"
    );

    let request = WebhookRequest {
        signature,
        event_type,
        room: params.room.as_deref(),
        body: &body,
    };

    let outcome = app_state.dispatcher().handle(request).await?;
    debug!(outcome = ?outcome, "Webhook handled");

    Ok(StatusCode::OK)
}

/// Extracts a header value as a string. Non-UTF-8 values count as absent.
fn get_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
