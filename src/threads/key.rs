//! Thread key resolution.
//!
//! Every event is mapped to the [`ThreadKey`] of the conversation it belongs
//! to. Rules, first match wins:
//!
//! 1. `pull_request` present: `github-<pull_request.html_url>`
//! 2. `issue` present: `github-<issue.html_url>`
//! 3. only a commit `sha` present: search GitHub for issues mentioning the
//!    commit, and use the highest-numbered hit; with no hits, or when the
//!    search fails or times out, `github-<sha>`
//! 4. otherwise no key; the notification is posted unthreaded
//!
//! A pull request's issue URL and PR URL are the same for conversation-tab
//! comments, so `issue_comment` events land in the PR's thread.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::types::{PrNumber, Sha, ThreadKey};
use crate::webhooks::WebhookPayload;

/// Default bound on the commit search round trip.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One issue or pull request returned by a commit search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub number: PrNumber,
    pub html_url: String,
}

/// Finds the issues and pull requests that reference a commit.
///
/// # Example (fake for testing)
///
/// ```ignore
/// struct FixedSearch(Vec<SearchHit>);
///
/// impl CommitSearch for FixedSearch {
///     type Error = std::convert::Infallible;
///
///     async fn search_commit(&self, _: &Sha, _: Option<&str>) -> Result<Vec<SearchHit>, Self::Error> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
pub trait CommitSearch {
    /// The error type returned by this search.
    type Error: fmt::Display;

    /// Searches for `sha`, optionally restricted to `repository` (`owner/name`).
    fn search_commit(
        &self,
        sha: &Sha,
        repository: Option<&str>,
    ) -> impl Future<Output = Result<Vec<SearchHit>, Self::Error>> + Send;
}

/// Key derivable from the payload alone, without any lookup.
pub fn direct_key(payload: &WebhookPayload) -> Option<ThreadKey> {
    if let Some(pr) = &payload.pull_request {
        return Some(ThreadKey::for_url(&pr.html_url));
    }
    if let Some(issue) = &payload.issue {
        return Some(ThreadKey::for_url(&issue.html_url));
    }
    None
}

/// Picks the hit with the highest number, taken as the most recent.
pub fn most_recent(hits: &[SearchHit]) -> Option<&SearchHit> {
    hits.iter().max_by_key(|hit| hit.number)
}

/// Resolves events to thread keys, searching GitHub when only a commit is known.
#[derive(Debug, Clone)]
pub struct ThreadKeyResolver<S> {
    search: S,
    timeout: Duration,
}

impl<S: CommitSearch> ThreadKeyResolver<S> {
    pub fn new(search: S, timeout: Duration) -> Self {
        Self { search, timeout }
    }

    /// Returns the thread key for an event, or `None` if it cannot be threaded.
    pub async fn resolve(&self, payload: &WebhookPayload) -> Option<ThreadKey> {
        if let Some(key) = direct_key(payload) {
            return Some(key);
        }

        let sha = payload.sha.as_ref()?;
        Some(self.resolve_commit(sha, repository_name(payload)).await)
    }

    /// Indirect resolution. Never fails: every error path degrades to the
    /// per-commit key.
    async fn resolve_commit(&self, sha: &Sha, repository: Option<&str>) -> ThreadKey {
        let lookup = tokio::time::timeout(self.timeout, self.search.search_commit(sha, repository));

        match lookup.await {
            Ok(Ok(hits)) => match most_recent(&hits) {
                Some(hit) => {
                    debug!(
                        sha = %sha,
                        number = %hit.number,
                        candidates = hits.len(),
                        "Resolved commit to pull request"
                    );
                    ThreadKey::for_url(&hit.html_url)
                }
                None => {
                    debug!(sha = %sha, "No pull request references commit");
                    ThreadKey::for_commit(sha)
                }
            },
            Ok(Err(e)) => {
                warn!(sha = %sha, error = %e, "Commit search failed, threading by commit");
                ThreadKey::for_commit(sha)
            }
            Err(_) => {
                warn!(
                    sha = %sha,
                    timeout = ?self.timeout,
                    "Commit search timed out, threading by commit"
                );
                ThreadKey::for_commit(sha)
            }
        }
    }
}

fn repository_name(payload: &WebhookPayload) -> Option<&str> {
    payload
        .repository
        .as_ref()
        .and_then(|r| r.full_name.as_deref())
}
