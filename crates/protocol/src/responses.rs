//! Response bodies.

use entities::{Book, LibrarySummary, User};
use serde::{Deserialize, Serialize};

// ============================================================================
// Auth Responses
// ============================================================================

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub user: User,
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

impl UserResponse {
    pub fn new(user: User) -> Self {
        Self {
            success: true,
            user,
        }
    }
}

// ============================================================================
// Book Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub book: Book,
}

impl BookResponse {
    pub fn new(book: Book) -> Self {
        Self {
            success: true,
            message: None,
            book,
        }
    }

    pub fn with_message(book: Book, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            book,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBooksResponse {
    pub success: bool,
    pub books: Vec<Book>,
    /// Number of books matching the filter, ignoring pagination.
    pub total: u32,
    /// Shelf counts over the caller's whole library.
    pub summary: LibrarySummary,
}

// ============================================================================
// Generic Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
