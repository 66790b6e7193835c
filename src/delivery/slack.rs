//! Slack Web API delivery via `chat.postMessage`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::types::MessageTs;
use crate::webhooks::Notification;

use super::{Deliver, Delivered, DeliveryError};

/// Default Slack Web API root.
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

/// Default bound on one `chat.postMessage` round trip.
pub const DEFAULT_SLACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Slack error codes meaning the destination does not resolve to a channel.
const NO_CHANNEL_ERRORS: &[&str] = &["channel_not_found", "not_in_channel", "is_archived"];

/// Posts notifications as Slack message attachments.
#[derive(Clone)]
pub struct SlackDelivery {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl SlackDelivery {
    /// Creates a client whose requests give up after `timeout`.
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, api_url, token))
    }

    pub fn with_client(
        http: reqwest::Client,
        api_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for SlackDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackDelivery")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// Builds the `chat.postMessage` body for a notification.
pub fn build_message(channel: &str, notification: &Notification) -> Value {
    let mut body = json!({
        "channel": channel,
        "attachments": [notification],
    });

    if let Some(ts) = &notification.thread_ts {
        body["thread_ts"] = json!(ts);
    }

    body
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    ts: Option<String>,
    error: Option<String>,
}

impl Deliver for SlackDelivery {
    async fn deliver(
        &self,
        destination: &str,
        notification: &Notification,
    ) -> Result<Delivered, DeliveryError> {
        let body = build_message(destination, notification);

        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.api_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected(format!("HTTP {status}: {text}")));
        }

        // Slack returns 200 for application errors; check "ok".
        let parsed: PostMessageResponse = response.json().await?;
        if !parsed.ok {
            let error = parsed.error.unwrap_or_else(|| "unknown".to_string());
            if NO_CHANNEL_ERRORS.contains(&error.as_str()) {
                return Err(DeliveryError::NoChannel(destination.to_string()));
            }
            return Err(DeliveryError::Rejected(error));
        }

        debug!(channel = %destination, ts = ?parsed.ts, "Posted message");
        Ok(Delivered {
            ts: parsed.ts.map(MessageTs::new),
        })
    }
}
