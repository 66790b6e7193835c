//! Runtime configuration from command-line flags and environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use thiserror::Error;

use crate::delivery::slack::{DEFAULT_SLACK_API_URL, DEFAULT_SLACK_TIMEOUT};
use crate::threads::DEFAULT_SEARCH_TIMEOUT;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Only one half of the GitHub basic-auth pair was given.
    #[error("--github-user and --github-password must be given together")]
    IncompleteGitHubCredentials,

    #[error("--search-timeout-secs must be greater than zero")]
    ZeroSearchTimeout,

    #[error("--slack-timeout-secs must be greater than zero")]
    ZeroSlackTimeout,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "pr-thread-relay",
    about = "Relays GitHub pull request activity into Slack threads",
    version
)]
pub struct Config {
    #[arg(
        long,
        env = "RELAY_LISTEN",
        default_value = "0.0.0.0:8080",
        help = "Address the webhook server listens on"
    )]
    pub listen: SocketAddr,

    #[arg(
        long = "webhook-secret",
        env = "HUBOT_GITHUB_SLACK_PR_THREADS_SECRET",
        hide_env_values = true,
        help = "Secret configured on the GitHub webhook. Without it every delivery is refused"
    )]
    pub webhook_secret: Option<String>,

    #[arg(
        long = "debug-payloads",
        env = "HUBOT_GITHUB_SLACK_PR_THREADS_DEBUG",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = FalseyValueParser::new(),
        help = "Log the full payload of events that produce no notification"
    )]
    pub debug_payloads: bool,

    #[arg(
        long = "registry-path",
        env = "RELAY_REGISTRY_PATH",
        default_value = "./state/threads.json",
        help = "File the thread registry is persisted to"
    )]
    pub registry_path: PathBuf,

    #[arg(
        long = "slack-token",
        env = "SLACK_BOT_TOKEN",
        hide_env_values = true,
        help = "Slack bot token used to post messages"
    )]
    pub slack_token: String,

    #[arg(
        long = "slack-api-url",
        env = "SLACK_API_URL",
        default_value = DEFAULT_SLACK_API_URL,
        help = "Base URL of the Slack Web API"
    )]
    pub slack_api_url: String,

    #[arg(
        long = "slack-timeout-secs",
        env = "SLACK_TIMEOUT_SECS",
        default_value_t = DEFAULT_SLACK_TIMEOUT.as_secs(),
        help = "Upper bound on one Slack API request"
    )]
    pub slack_timeout_secs: u64,

    #[arg(
        long = "github-user",
        env = "GITHUB_USER",
        help = "GitHub user for commit search. Searches anonymously when absent"
    )]
    pub github_user: Option<String>,

    #[arg(
        long = "github-password",
        env = "GITHUB_PASSWORD",
        hide_env_values = true,
        help = "Password or token for --github-user"
    )]
    pub github_password: Option<String>,

    #[arg(
        long = "github-api-url",
        env = "GITHUB_API_URL",
        default_value = "https://api.github.com",
        help = "Base URL of the GitHub REST API"
    )]
    pub github_api_url: String,

    #[arg(
        long = "search-timeout-secs",
        env = "RELAY_SEARCH_TIMEOUT_SECS",
        default_value_t = DEFAULT_SEARCH_TIMEOUT.as_secs(),
        help = "Upper bound on the commit search round trip"
    )]
    pub search_timeout_secs: u64,
}

impl Config {
    /// Checks constraints clap cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github_user.is_some() != self.github_password.is_some() {
            return Err(ConfigError::IncompleteGitHubCredentials);
        }
        if self.search_timeout_secs == 0 {
            return Err(ConfigError::ZeroSearchTimeout);
        }
        if self.slack_timeout_secs == 0 {
            return Err(ConfigError::ZeroSlackTimeout);
        }
        Ok(())
    }

    /// Basic-auth pair for the search client, if configured.
    pub fn github_credentials(&self) -> Option<(&str, &str)> {
        match (&self.github_user, &self.github_password) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn slack_timeout(&self) -> Duration {
        Duration::from_secs(self.slack_timeout_secs)
    }

    /// Webhook secret as bytes. An empty secret counts as not configured.
    pub fn webhook_secret_bytes(&self) -> Option<Vec<u8>> {
        self.webhook_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_bytes().to_vec())
    }
}
