//! Account endpoints: password changes, recovery and deletion.

use std::sync::Arc;

use auth::{
    ResetToken, hash_password, hash_reset_token, validate_password_strength, verify_password,
};
use axum::{Extension, Json, extract::State};
use book_store::BookStore;
use chrono::{Duration, Utc};
use entities::PasswordReset;
use protocol::{requests::*, responses::*};

use crate::api::{auth::normalize_email, profile::current_user};
use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;

fn check_new_password(new_password: &str, confirm_password: &str) -> ServerResult<()> {
    if new_password != confirm_password {
        return Err(ServerError::PasswordMismatch);
    }
    validate_password_strength(new_password)?;
    Ok(())
}

/// Changes the caller's password after checking the current one.
pub async fn change_password<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> ServerResult<Json<MessageResponse>> {
    let mut user = current_user(&state, &user).await?;

    if !verify_password(&request.current_password, &user.password_hash)? {
        return Err(ServerError::IncorrectPassword);
    }
    check_new_password(&request.new_password, &request.confirm_password)?;

    user.password_hash = hash_password(&request.new_password)?;
    user.updated_at = Utc::now();
    state.store.update_user(user).await?;

    Ok(Json(MessageResponse::new("Password changed")))
}

/// Deletes the caller's account and every book in it.
pub async fn delete_account<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<DeleteAccountRequest>,
) -> ServerResult<Json<MessageResponse>> {
    let user = current_user(&state, &user).await?;

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(ServerError::IncorrectPassword);
    }

    state.store.delete_user(user.id).await?;
    tracing::info!(user_id = %user.id, "Account deleted");

    Ok(Json(MessageResponse::new("Account deleted")))
}

/// Issues a password reset token and mails the reset link.
pub async fn forgot_password<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(request): ApiJson<ForgotPasswordRequest>,
) -> ServerResult<Json<MessageResponse>> {
    let user = state
        .store
        .get_user_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(|| ServerError::NotFound("Account".to_string()))?;

    let token = ResetToken::generate();
    let expires_at = Utc::now() + Duration::minutes(state.config.reset_token_ttl_minutes);
    state
        .store
        .put_password_reset(PasswordReset::new(user.id, token.hash, expires_at))
        .await?;

    let link = state.config.reset_link(&token.token);
    state.mailer.send_password_reset(&user, &link).await?;
    tracing::info!(user_id = %user.id, %expires_at, "Password reset issued");

    Ok(Json(MessageResponse::new("Password reset link sent")))
}

/// Sets a new password using a mailed reset token.
pub async fn reset_password<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> ServerResult<Json<MessageResponse>> {
    check_new_password(&request.new_password, &request.confirm_password)?;

    // Taken before the expiry check so an expired token is also discarded.
    let reset = state
        .store
        .take_password_reset(&hash_reset_token(request.token.trim()))
        .await?
        .ok_or(ServerError::InvalidResetToken)?;
    if reset.is_expired(Utc::now()) {
        return Err(ServerError::InvalidResetToken);
    }

    let mut user = state
        .store
        .get_user(reset.user_id)
        .await?
        .ok_or(ServerError::InvalidResetToken)?;
    user.password_hash = hash_password(&request.new_password)?;
    user.updated_at = Utc::now();
    state.store.update_user(user).await?;
    tracing::info!(user_id = %reset.user_id, "Password reset");

    Ok(Json(MessageResponse::new("Password has been reset")))
}
