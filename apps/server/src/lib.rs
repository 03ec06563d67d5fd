//! Readlog server
//!
//! HTTP API for a personal reading tracker: accounts, a per-user library of
//! books and the reading lifecycle of each book.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::Router;
use book_store::BookStore;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::services::{LogMailer, Mailer};
use crate::state::AppState;

/// Creates the application router with all routes configured.
pub fn create_app<S: BookStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::create_router(state.clone())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Creates the application state, logging outgoing e-mail.
pub fn create_state<S: BookStore>(config: Config, store: S) -> Arc<AppState<S>> {
    create_state_with_mailer(config, store, Arc::new(LogMailer))
}

/// Creates the application state with a custom mailer.
pub fn create_state_with_mailer<S: BookStore>(
    config: Config,
    store: S,
    mailer: Arc<dyn Mailer>,
) -> Arc<AppState<S>> {
    Arc::new(AppState::new(config, store, mailer))
}

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
