//! PR Thread Relay - relays GitHub pull request activity into Slack threads.
//!
//! Every event about one pull request (open, review, comment, close, and CI
//! status of its commits) is posted as a reply under the first message the
//! relay posted for that pull request.

pub mod config;
pub mod delivery;
pub mod dispatch;
pub mod github;
pub mod persistence;
pub mod server;
pub mod threads;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
