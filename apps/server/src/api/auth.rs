//! Registration, login and session endpoints.

use std::sync::Arc;

use auth::{AuthError, hash_password, validate_password_strength, verify_password};
use axum::{Extension, Json, extract::State, http::StatusCode};
use book_store::BookStore;
use entities::User;
use protocol::{requests::*, responses::*};

use crate::api::profile::current_user;
use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;

fn auth_response<S: BookStore>(state: &AppState<S>, user: User) -> ServerResult<AuthResponse> {
    let access_token = state
        .jwt_manager
        .generate_token(user.id, &user.email, &user.username)?;

    Ok(AuthResponse {
        success: true,
        user,
        access_token,
        expires_in: state.jwt_manager.expiration_seconds(),
    })
}

/// Normalizes an e-mail address for storage and lookup.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates an account and signs it in.
pub async fn register<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ServerResult<(StatusCode, Json<AuthResponse>)> {
    let username = request.username.trim();
    let email = normalize_email(&request.email);
    if username.is_empty() || email.is_empty() {
        return Err(ServerError::InvalidRequest(
            "Username and email are required".to_string(),
        ));
    }
    validate_password_strength(&request.password)?;

    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(ServerError::UserAlreadyExists(email));
    }
    if state.store.get_user_by_username(username).await?.is_some() {
        return Err(ServerError::UserAlreadyExists(username.to_string()));
    }

    let mut user = User::new(username, email, hash_password(&request.password)?);
    user.name = request.name.filter(|n| !n.trim().is_empty());
    user.last_name = request.last_name.filter(|n| !n.trim().is_empty());

    let user = state.store.create_user(user).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

/// Exchanges e-mail and password for an access token.
pub async fn login<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ServerResult<Json<AuthResponse>> {
    let user = state
        .store
        .get_user_by_email(&normalize_email(&request.email))
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&request.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(auth_response(&state, user)?))
}

/// Gets the current authenticated user.
pub async fn get_current_user<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ServerResult<Json<UserResponse>> {
    let user = current_user(&state, &user).await?;
    Ok(Json(UserResponse::new(user)))
}
