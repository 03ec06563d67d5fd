//! Book store trait definitions.

use async_trait::async_trait;
use entities::{Book, BookSort, PasswordReset, ReadingStatus, User};
use uuid::Uuid;

use crate::BookStoreResult;

/// Filter options for listing books.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Filter by owner.
    pub user_id: Option<Uuid>,
    /// Filter by reading status.
    pub status: Option<ReadingStatus>,
    /// Sort order; defaults to the shelf's natural order.
    pub sort: Option<BookSort>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

impl BookFilter {
    /// Lists every book owned by `user_id`.
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    /// Restricts the listing to one shelf.
    pub fn with_status(mut self, status: ReadingStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sort order to apply.
    pub fn effective_sort(&self) -> BookSort {
        self.sort.unwrap_or_else(|| BookSort::default_for(self.status))
    }
}

/// Trait for book storage operations.
///
/// Updates are last-write-wins; the store is the only source of atomicity.
#[async_trait]
pub trait BookStore: Send + Sync {
    // =========================================================================
    // User operations
    // =========================================================================

    /// Creates a new user. Fails if the email or username is taken.
    async fn create_user(&self, user: User) -> BookStoreResult<User>;

    /// Gets a user by ID.
    async fn get_user(&self, id: Uuid) -> BookStoreResult<Option<User>>;

    /// Gets a user by email.
    async fn get_user_by_email(&self, email: &str) -> BookStoreResult<Option<User>>;

    /// Gets a user by username.
    async fn get_user_by_username(&self, username: &str) -> BookStoreResult<Option<User>>;

    /// Updates a user.
    async fn update_user(&self, user: User) -> BookStoreResult<User>;

    /// Deletes a user together with their books and password reset.
    async fn delete_user(&self, id: Uuid) -> BookStoreResult<()>;

    // =========================================================================
    // Book operations
    // =========================================================================

    /// Creates a new book. Fails if the owner already has the same ISBN.
    async fn create_book(&self, book: Book) -> BookStoreResult<Book>;

    /// Gets a book by ID.
    async fn get_book(&self, id: Uuid) -> BookStoreResult<Option<Book>>;

    /// Gets a user's book by ISBN.
    async fn get_book_by_isbn(&self, user_id: Uuid, isbn: &str) -> BookStoreResult<Option<Book>>;

    /// Lists books with optional filters, returning the page and the total
    /// number of matches.
    async fn list_books(&self, filter: BookFilter) -> BookStoreResult<(Vec<Book>, u32)>;

    /// Updates a book.
    async fn update_book(&self, book: Book) -> BookStoreResult<Book>;

    /// Deletes a book.
    async fn delete_book(&self, id: Uuid) -> BookStoreResult<()>;

    // =========================================================================
    // Password reset operations
    // =========================================================================

    /// Stores a reset, replacing any outstanding one for the same user.
    async fn put_password_reset(&self, reset: PasswordReset) -> BookStoreResult<()>;

    /// Retrieves and removes a reset by token hash.
    ///
    /// Removal on retrieval keeps a token from being redeemed twice.
    async fn take_password_reset(&self, token_hash: &str)
        -> BookStoreResult<Option<PasswordReset>>;
}
