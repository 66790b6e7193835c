//! GitHub API client.
//!
//! Implements the commit search the thread resolver needs via the octocrab
//! library. Errors are categorized as transient or permanent for reporting.

mod client;
mod error;

pub use client::{OctocrabSearch, commit_query};
pub use error::{GitHubApiError, GitHubErrorKind};
