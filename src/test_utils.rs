//! Shared test doubles for the relay's collaborators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::delivery::{Deliver, Delivered, DeliveryError};
use crate::github::GitHubApiError;
use crate::threads::{CommitSearch, SearchHit};
use crate::types::{MessageTs, Sha};
use crate::webhooks::{Notification, SignatureAlgorithm, compute_signature, format_signature_header};

/// `X-Hub-Signature` value for `body` signed with `secret`.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    let algorithm = SignatureAlgorithm::Sha1;
    format_signature_header(algorithm, &compute_signature(algorithm, body, secret))
}

/// `X-Hub-Signature-256` value for `body` signed with `secret`.
pub fn sign_sha256(secret: &[u8], body: &[u8]) -> String {
    let algorithm = SignatureAlgorithm::Sha256;
    format_signature_header(algorithm, &compute_signature(algorithm, body, secret))
}

// ─── Commit search ───

#[derive(Debug, Default)]
struct SearchLog {
    calls: usize,
    last_query: Option<(Sha, Option<String>)>,
}

/// Commit search returning canned results. Clones share the call log.
#[derive(Debug, Clone)]
pub struct FakeSearch {
    result: Result<Vec<SearchHit>, String>,
    delay: Option<Duration>,
    log: Arc<Mutex<SearchLog>>,
}

impl FakeSearch {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            result: Ok(hits),
            delay: None,
            log: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            delay: None,
            log: Arc::default(),
        }
    }

    /// Sleeps before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.log.lock().unwrap().calls
    }

    pub fn last_query(&self) -> Option<(Sha, Option<String>)> {
        self.log.lock().unwrap().last_query.clone()
    }
}

impl CommitSearch for FakeSearch {
    type Error = GitHubApiError;

    async fn search_commit(
        &self,
        sha: &Sha,
        repository: Option<&str>,
    ) -> Result<Vec<SearchHit>, Self::Error> {
        {
            let mut log = self.log.lock().unwrap();
            log.calls += 1;
            log.last_query = Some((sha.clone(), repository.map(str::to_string)));
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.result
            .clone()
            .map_err(GitHubApiError::transient_without_source)
    }
}

// ─── Delivery ───

#[derive(Debug, Default)]
struct DeliveryLog {
    sent: Vec<(String, Notification)>,
    timestamps: VecDeque<MessageTs>,
}

/// Delivery that records every notification instead of posting it.
///
/// Answers with the configured timestamps in order, then with no timestamp.
/// Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingDelivery {
    fail: bool,
    delay: Option<Duration>,
    log: Arc<Mutex<DeliveryLog>>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamps<I, T>(timestamps: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let delivery = Self::default();
        delivery.log.lock().unwrap().timestamps =
            timestamps.into_iter().map(MessageTs::new).collect();
        delivery
    }

    /// Every delivery is rejected.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Sleeps before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Notifications delivered so far, with their destinations.
    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.log.lock().unwrap().sent.clone()
    }
}

impl Deliver for RecordingDelivery {
    async fn deliver(
        &self,
        destination: &str,
        notification: &Notification,
    ) -> Result<Delivered, DeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(DeliveryError::Rejected("recording delivery set to fail".to_string()));
        }

        let mut log = self.log.lock().unwrap();
        log.sent.push((destination.to_string(), notification.clone()));
        Ok(Delivered {
            ts: log.timestamps.pop_front(),
        })
    }
}
