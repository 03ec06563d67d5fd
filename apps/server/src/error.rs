//! Server error types.

use auth::AuthError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use book_store::BookStoreError;
use protocol::{ErrorBody, error_codes};
use reading_progress::ReadingError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Authentication required.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The password given to confirm an account operation was wrong.
    #[error("Password is incorrect")]
    IncorrectPassword,

    /// New password and its confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Unknown, used or expired password reset token.
    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    /// Email or username already registered.
    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    /// Rejected reading mutation.
    #[error(transparent)]
    Reading(#[from] ReadingError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Store(#[from] BookStoreError),

    /// Authentication error.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Status code, error code and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST, msg.clone())
            }
            ServerError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                error_codes::RESOURCE_NOT_FOUND,
                self.to_string(),
            ),
            ServerError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTHENTICATION_REQUIRED,
                self.to_string(),
            ),
            ServerError::IncorrectPassword => (
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_CREDENTIALS,
                self.to_string(),
            ),
            ServerError::PasswordMismatch => (
                StatusCode::BAD_REQUEST,
                error_codes::PASSWORD_MISMATCH,
                self.to_string(),
            ),
            ServerError::InvalidResetToken => (
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_RESET_TOKEN,
                self.to_string(),
            ),
            ServerError::UserAlreadyExists(_) => (
                StatusCode::BAD_REQUEST,
                error_codes::USER_ALREADY_EXISTS,
                self.to_string(),
            ),
            ServerError::Reading(e) => (StatusCode::BAD_REQUEST, reading_code(e), e.to_string()),
            ServerError::Store(e) => match e {
                BookStoreError::NotFound { entity_type, .. } => (
                    StatusCode::NOT_FOUND,
                    error_codes::RESOURCE_NOT_FOUND,
                    format!("{entity_type} not found"),
                ),
                BookStoreError::AlreadyExists {
                    entity_type: "Book",
                    ..
                } => (
                    StatusCode::CONFLICT,
                    error_codes::DUPLICATE_BOOK,
                    "A book with this ISBN is already in your library".to_string(),
                ),
                BookStoreError::AlreadyExists { .. } => (
                    StatusCode::BAD_REQUEST,
                    error_codes::USER_ALREADY_EXISTS,
                    "Email or username already in use".to_string(),
                ),
                _ => internal(),
            },
            ServerError::Auth(e) => match e {
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    error_codes::INVALID_CREDENTIALS,
                    e.to_string(),
                ),
                AuthError::WeakPassword { .. } => {
                    (StatusCode::BAD_REQUEST, error_codes::WEAK_PASSWORD, e.to_string())
                }
                AuthError::TokenExpired | AuthError::InvalidToken | AuthError::JwtValidation(_) => (
                    StatusCode::UNAUTHORIZED,
                    error_codes::AUTHENTICATION_REQUIRED,
                    e.to_string(),
                ),
                _ => internal(),
            },
            ServerError::Internal(_) => internal(),
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_codes::INTERNAL_ERROR,
        "Internal server error".to_string(),
    )
}

fn reading_code(error: &ReadingError) -> &'static str {
    match error {
        ReadingError::InvalidTransition { .. } => error_codes::INVALID_TRANSITION,
        ReadingError::PageOutOfRange { .. } => error_codes::PAGE_OUT_OF_RANGE,
        ReadingError::InvalidDateRange { .. } => error_codes::INVALID_DATE_RANGE,
        ReadingError::MissingRequiredField(_) => error_codes::MISSING_REQUIRED_FIELD,
        ReadingError::RatingOutOfRange { .. } => error_codes::RATING_OUT_OF_RANGE,
        ReadingError::NotesTooLong { .. } => error_codes::NOTES_TOO_LONG,
        ReadingError::FutureDate { .. } => error_codes::FUTURE_DATE,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::InvalidRequest(rejection.body_text())
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
