//! GitHub webhook event types.
//!
//! The relay handles these webhook events:
//!
//! - `pull_request` - PR lifecycle (opened, closed, reopened, edited, ...)
//! - `pull_request_review` - reviews on a PR
//! - `pull_request_review_comment` - line comments on a PR diff
//! - `issue_comment` - comments on the PR conversation tab (and on issues)
//! - `status` - commit status updates (legacy Status API)
//!
//! Payloads are deserialized leniently: every section the relay might look
//! at is optional, and unknown fields are ignored. Which sections are present
//! decides how an event is classified and threaded.

use serde::Deserialize;
use std::fmt;

use crate::types::{PrNumber, Sha};

/// The `X-GitHub-Event` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
    IssueComment,
    /// `status` on the wire.
    CommitStatus,
    /// Anything else; kept verbatim for diagnostics.
    Unknown(String),
}

impl EventType {
    /// Maps a header value to an event type. Never fails: unrecognized
    /// values become [`EventType::Unknown`].
    pub fn from_header(value: &str) -> Self {
        match value {
            "pull_request" => EventType::PullRequest,
            "pull_request_review" => EventType::PullRequestReview,
            "pull_request_review_comment" => EventType::PullRequestReviewComment,
            "issue_comment" => EventType::IssueComment,
            "status" => EventType::CommitStatus,
            other => EventType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::PullRequest => "pull_request",
            EventType::PullRequestReview => "pull_request_review",
            EventType::PullRequestReviewComment => "pull_request_review_comment",
            EventType::IssueComment => "issue_comment",
            EventType::CommitStatus => "status",
            EventType::Unknown(other) => other,
        }
    }

    /// True for the three event types whose payload is centred on a
    /// `pull_request` object.
    pub fn is_pull_request_family(&self) -> bool {
        matches!(
            self,
            EventType::PullRequest
                | EventType::PullRequestReview
                | EventType::PullRequestReviewComment
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound webhook delivery, alive for the duration of a request.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub event_type: EventType,
    /// The exact bytes GitHub signed.
    pub raw_body: Vec<u8>,
    pub payload: WebhookPayload,
}

impl InboundEvent {
    /// Parses the body of a delivery whose signature has already been checked.
    pub fn parse(event_type: EventType, raw_body: Vec<u8>) -> Result<Self, serde_json::Error> {
        let payload = serde_json::from_slice(&raw_body)?;
        Ok(InboundEvent {
            event_type,
            raw_body,
            payload,
        })
    }

    /// The body as text, for diagnostics.
    pub fn body_lossy(&self) -> String {
        String::from_utf8_lossy(&self.raw_body).into_owned()
    }
}

// ============================================================================
// Payload structures
//
// These match GitHub's webhook JSON structure. Option<T> is used liberally
// since each event type carries a different subset of sections.
// ============================================================================

/// The union of every payload section the relay reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookPayload {
    pub action: Option<String>,
    pub pull_request: Option<PullRequest>,
    pub issue: Option<Issue>,
    pub comment: Option<Comment>,
    pub sender: Option<User>,
    pub repository: Option<Repository>,

    // `status` events carry these at the top level.
    pub sha: Option<Sha>,
    pub state: Option<String>,
    pub context: Option<String>,
    pub description: Option<String>,
    pub target_url: Option<String>,
    pub commit: Option<StatusCommit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: PrNumber,
    pub html_url: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub user: Option<User>,
    pub merged: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    pub number: PrNumber,
    pub html_url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    pub html_url: String,
    pub body: Option<String>,
    pub user: Option<User>,
}

/// A GitHub account as embedded in webhook payloads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub login: String,
    /// Canonical profile page (`https://github.com/<login>`).
    pub html_url: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub full_name: Option<String>,
}

/// The `commit` section of a `status` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusCommit {
    pub html_url: Option<String>,
    /// GitHub account of the author, `null` when the email is not linked.
    pub author: Option<User>,
    pub committer: Option<User>,
    /// Raw git metadata.
    pub commit: Option<GitCommit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitCommit {
    pub author: Option<GitActor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitActor {
    pub name: Option<String>,
}
