//! API endpoints.

pub mod account;
pub mod auth;
pub mod book;
pub mod profile;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use book_store::BookStore;

use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Creates the API router with all endpoints.
///
/// Everything except health, registration, login and the password reset
/// flow requires a bearer token.
pub fn create_router<S: BookStore + 'static>(state: Arc<AppState<S>>) -> Router<Arc<AppState<S>>> {
    let protected = Router::new()
        // Session
        .route("/api/auth/me", get(auth::get_current_user))
        // Book endpoints
        .route("/api/book/create", post(book::create_book))
        .route("/api/book/list", post(book::list_books))
        .route("/api/book/get", post(book::get_book))
        .route("/api/book/start-reading", post(book::start_reading))
        .route("/api/book/update-progress", post(book::update_progress))
        .route("/api/book/finish-reading", post(book::finish_reading))
        .route("/api/book/update-details", post(book::update_details))
        .route("/api/book/delete", post(book::delete_book))
        // Profile endpoints
        .route("/api/profile/get", post(profile::get_profile))
        .route("/api/profile/update", post(profile::update_profile))
        // Account endpoints
        .route("/api/account/change-password", post(account::change_password))
        .route("/api/account/delete", post(account::delete_account))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware::<S>));

    Router::new()
        // Auth endpoints
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        // Password recovery
        .route("/api/account/forgot-password", post(account::forgot_password))
        .route("/api/account/reset-password", post(account::reset_password))
        // Health check
        .route("/health", get(health_check))
        .merge(protected)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
