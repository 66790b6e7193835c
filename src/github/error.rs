//! GitHub API error types.
//!
//! Errors are categorized so that logs distinguish conditions that clear up
//! by themselves from those needing an operator:
//!
//! - **Transient** errors (5xx, rate limits, network failures, timeouts)
//! - **Permanent** errors (most 4xx: bad credentials, invalid query, ...)
//!
//! Either way the resolver falls back to per-commit threading; the kind only
//! changes how the failure is reported.

use std::fmt;
use thiserror::Error;

/// The kind of GitHub API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// Likely to succeed if repeated later.
    ///
    /// Examples:
    /// - HTTP 5xx (server errors)
    /// - HTTP 429 (rate limited)
    /// - HTTP 403 with a rate limit message
    /// - Network failures and timeouts
    Transient,

    /// Will keep failing until configuration changes.
    ///
    /// Examples:
    /// - HTTP 401 (bad basic-auth credentials)
    /// - HTTP 422 (search query rejected)
    Permanent,
}

impl GitHubErrorKind {
    pub fn is_transient(&self) -> bool {
        matches!(self, GitHubErrorKind::Transient)
    }
}

/// A GitHub API error with categorization.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,

    /// The HTTP status code, if available.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hint = if self.kind.is_transient() {
            ", may clear up"
        } else {
            ""
        };
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {code}{hint}): {}", self.message),
            None if hint.is_empty() => write!(f, "GitHub API error: {}", self.message),
            None => write!(f, "GitHub API error (may clear up): {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Creates a transient error without an octocrab source.
    pub fn transient_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Categorizes an octocrab error.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = Self::extract_status_code(&err);
        let message = err.to_string();

        let kind = match status_code {
            Some(429) => GitHubErrorKind::Transient,
            Some(403) if is_rate_limit_error(&message) => GitHubErrorKind::Transient,
            Some(code) if (500..600).contains(&code) => GitHubErrorKind::Transient,
            Some(_) => GitHubErrorKind::Permanent,
            None if is_network_error(&message) => GitHubErrorKind::Transient,
            None => GitHubErrorKind::Permanent,
        };

        Self {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }

    /// Extracts the HTTP status code from an octocrab error, if the API
    /// answered at all.
    fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
        match err {
            octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
            _ => None,
        }
    }
}

/// Checks if an error message indicates a rate limit.
fn is_rate_limit_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("api rate")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}

/// Checks if an error message indicates a network-level error.
fn is_network_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("timeout")
        || message_lower.contains("connection")
        || message_lower.contains("network")
        || message_lower.contains("dns")
        || message_lower.contains("timed out")
}
