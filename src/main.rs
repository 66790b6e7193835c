use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pr_thread_relay::config::Config;
use pr_thread_relay::delivery::SlackDelivery;
use pr_thread_relay::dispatch::Dispatcher;
use pr_thread_relay::github::OctocrabSearch;
use pr_thread_relay::server::{AppState, WEBHOOK_PATH, build_router};
use pr_thread_relay::threads::{FileThreadRegistry, ThreadKeyResolver};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pr_thread_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    config.validate()?;

    let secret = config.webhook_secret_bytes();
    if secret.is_none() {
        warn!("No webhook secret configured; every delivery will be rejected");
    }

    let registry = FileThreadRegistry::open(&config.registry_path).with_context(|| {
        format!(
            "failed to load thread registry from {}",
            config.registry_path.display()
        )
    })?;
    info!(
        path = %registry.path().display(),
        threads = registry.len(),
        "Loaded thread registry"
    );

    let search = match config.github_credentials() {
        Some((user, password)) => {
            OctocrabSearch::with_basic_auth(&config.github_api_url, user, password)
        }
        None => {
            warn!("No GitHub credentials configured; commit search is anonymous");
            OctocrabSearch::anonymous(&config.github_api_url)
        }
    }
    .context("failed to build GitHub client")?;

    let delivery = SlackDelivery::new(
        &config.slack_api_url,
        &config.slack_token,
        config.slack_timeout(),
    )
    .context("failed to build Slack client")?;

    let dispatcher = Dispatcher::new(
        secret,
        ThreadKeyResolver::new(search, config.search_timeout()),
        registry,
        delivery,
    )
    .with_debug_payloads(config.debug_payloads);

    let app = build_router(AppState::new(dispatcher));

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!(addr = %config.listen, path = WEBHOOK_PATH, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
