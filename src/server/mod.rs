//! HTTP server for the relay.
//!
//! # Endpoints
//!
//! - `POST /hubot/gh-pull-requests?room=<channel>` - Accepts GitHub webhook
//!   deliveries and relays them to the chat room (returns 200)
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

use crate::delivery::Deliver;
use crate::dispatch::Dispatcher;
use crate::threads::{CommitSearch, ThreadRegistry};

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::webhook_handler;

/// Path GitHub is configured to deliver webhooks to.
pub const WEBHOOK_PATH: &str = "/hubot/gh-pull-requests";

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<S, R, D> {
    dispatcher: Arc<Dispatcher<S, R, D>>,
}

// Manual impl: a derive would require the collaborators to be Clone.
impl<S, R, D> Clone for AppState<S, R, D> {
    fn clone(&self) -> Self {
        AppState {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<S, R, D> AppState<S, R, D> {
    pub fn new(dispatcher: Dispatcher<S, R, D>) -> Self {
        AppState {
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<S, R, D> {
        &self.dispatcher
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<S, R, D>(app_state: AppState<S, R, D>) -> axum::Router
where
    S: CommitSearch + Send + Sync + 'static,
    R: ThreadRegistry + 'static,
    D: Deliver + Send + Sync + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route(WEBHOOK_PATH, post(webhook_handler::<S, R, D>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
