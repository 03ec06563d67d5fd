//! Error codes and the error response body.

use serde::{Deserialize, Serialize};

/// Machine-readable error codes.
pub mod error_codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const MISSING_REQUIRED_FIELD: &str = "MISSING_REQUIRED_FIELD";
    pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
    pub const PAGE_OUT_OF_RANGE: &str = "PAGE_OUT_OF_RANGE";
    pub const INVALID_DATE_RANGE: &str = "INVALID_DATE_RANGE";
    pub const RATING_OUT_OF_RANGE: &str = "RATING_OUT_OF_RANGE";
    pub const NOTES_TOO_LONG: &str = "NOTES_TOO_LONG";
    pub const FUTURE_DATE: &str = "FUTURE_DATE";
    pub const WEAK_PASSWORD: &str = "WEAK_PASSWORD";
    pub const PASSWORD_MISMATCH: &str = "PASSWORD_MISMATCH";
    pub const INVALID_RESET_TOKEN: &str = "INVALID_RESET_TOKEN";
    pub const USER_ALREADY_EXISTS: &str = "USER_ALREADY_EXISTS";
    pub const AUTHENTICATION_REQUIRED: &str = "AUTHENTICATION_REQUIRED";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const RESOURCE_NOT_FOUND: &str = "RESOURCE_NOT_FOUND";
    pub const DUPLICATE_BOOK: &str = "DUPLICATE_BOOK";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Body of every failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// One of [`error_codes`].
    pub code: String,
}

impl ErrorBody {
    /// Creates an error body.
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            code: code.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
