//! Authentication middleware.

use std::sync::Arc;

use auth::{Claims, JwtManager};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use book_store::BookStore;
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Authenticated user information.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User ID.
    pub id: Uuid,
    /// User email at the time the token was issued.
    pub email: String,
    /// Username at the time the token was issued.
    pub username: String,
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = auth::AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: claims.user_id()?,
            email: claims.email,
            username: claims.username,
        })
    }
}

/// Extracts the bearer token from the Authorization header.
fn extract_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(jwt_manager: &JwtManager, token: &str) -> ServerResult<AuthenticatedUser> {
    let claims = jwt_manager.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        ServerError::AuthenticationRequired
    })?;
    AuthenticatedUser::try_from(claims).map_err(|_| ServerError::AuthenticationRequired)
}

/// Authentication middleware.
///
/// Validates the bearer token and stores the [`AuthenticatedUser`] in the
/// request extensions. Requests without a valid token are rejected with 401.
pub async fn auth_middleware<S: BookStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> ServerResult<Response> {
    let token = extract_token(&request).ok_or(ServerError::AuthenticationRequired)?;
    let user = authenticate(&state.jwt_manager, token)?;

    tracing::debug!(user_id = %user.id, "Authenticated request");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
