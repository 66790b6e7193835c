//! Octocrab client used to find the pull request behind a commit.

use octocrab::Octocrab;

use crate::threads::{CommitSearch, SearchHit};
use crate::types::{PrNumber, Sha};

use super::error::GitHubApiError;

/// Searches GitHub issues and pull requests for a commit SHA.
#[derive(Clone)]
pub struct OctocrabSearch {
    client: Octocrab,
}

impl OctocrabSearch {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Creates a client authenticating with HTTP basic auth against the
    /// given API root (`https://api.github.com` or an Enterprise endpoint).
    pub fn with_basic_auth(
        api_url: &str,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder()
            .base_uri(api_url)?
            .basic_auth(user.into(), password.into())
            .build()?;
        Ok(Self::new(client))
    }

    /// Creates an unauthenticated client. Search works but is heavily
    /// rate limited.
    pub fn anonymous(api_url: &str) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder().base_uri(api_url)?.build()?;
        Ok(Self::new(client))
    }
}

impl std::fmt::Debug for OctocrabSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabSearch").finish_non_exhaustive()
    }
}

/// Builds the issue search query for a commit, scoped to a repository
/// when one is known.
pub fn commit_query(sha: &Sha, repository: Option<&str>) -> String {
    match repository {
        Some(repo) => format!("{} repo:{}", sha.as_str(), repo),
        None => sha.as_str().to_string(),
    }
}

impl CommitSearch for OctocrabSearch {
    type Error = GitHubApiError;

    async fn search_commit(
        &self,
        sha: &Sha,
        repository: Option<&str>,
    ) -> Result<Vec<SearchHit>, Self::Error> {
        let query = commit_query(sha, repository);

        let page = self
            .client
            .search()
            .issues_and_pull_requests(&query)
            .per_page(100)
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        Ok(page
            .items
            .into_iter()
            .map(|issue| SearchHit {
                number: PrNumber(issue.number),
                html_url: issue.html_url.to_string(),
            })
            .collect())
    }
}
