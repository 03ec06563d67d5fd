//! Profile endpoints.

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use book_store::BookStore;
use chrono::Utc;
use entities::User;
use protocol::{requests::*, responses::*};

use crate::api::auth::normalize_email;
use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;

/// Loads the account behind an access token.
///
/// A token that outlived its account is treated as unauthenticated.
pub(crate) async fn current_user<S: BookStore>(
    state: &AppState<S>,
    user: &AuthenticatedUser,
) -> ServerResult<User> {
    state
        .store
        .get_user(user.id)
        .await?
        .ok_or(ServerError::AuthenticationRequired)
}

/// Gets the caller's profile.
pub async fn get_profile<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ServerResult<Json<UserResponse>> {
    let user = current_user(&state, &user).await?;
    Ok(Json(UserResponse::new(user)))
}

/// Updates the caller's names, username or e-mail.
pub async fn update_profile<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> ServerResult<Json<UserResponse>> {
    let mut user = current_user(&state, &user).await?;

    if let Some(username) = request.username {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(ServerError::InvalidRequest("Username cannot be empty".to_string()));
        }
        if username != user.username {
            if state.store.get_user_by_username(&username).await?.is_some() {
                return Err(ServerError::UserAlreadyExists(username));
            }
            user.username = username;
        }
    }

    if let Some(email) = request.email {
        let email = normalize_email(&email);
        if email.is_empty() {
            return Err(ServerError::InvalidRequest("Email cannot be empty".to_string()));
        }
        if email != user.email {
            if state.store.get_user_by_email(&email).await?.is_some() {
                return Err(ServerError::UserAlreadyExists(email));
            }
            user.email = email;
        }
    }

    if let Some(name) = request.name {
        user.name = Some(name).filter(|n| !n.trim().is_empty());
    }
    if let Some(last_name) = request.last_name {
        user.last_name = Some(last_name).filter(|n| !n.trim().is_empty());
    }

    user.updated_at = Utc::now();
    let user = state.store.update_user(user).await?;
    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(UserResponse::new(user)))
}
