//! In-memory book store implementation for testing.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use entities::{Book, PasswordReset, User};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{BookFilter, BookStore, BookStoreError, BookStoreResult};

/// In-memory book store for tests and throwaway instances.
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    books: Arc<RwLock<HashMap<Uuid, Book>>>,
    password_resets: Arc<RwLock<HashMap<Uuid, PasswordReset>>>,
}

impl MemoryBookStore {
    /// Creates a new in-memory book store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> BookStoreResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(BookStoreError::already_exists("User", user.id.to_string()));
        }
        if let Some(existing) = users
            .values()
            .find(|u| u.email == user.email || u.username == user.username)
        {
            let key = if existing.email == user.email {
                &user.email
            } else {
                &user.username
            };
            return Err(BookStoreError::already_exists("User", key.clone()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> BookStoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> BookStoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> BookStoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn update_user(&self, user: User) -> BookStoreResult<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(BookStoreError::not_found("User", user.id.to_string()));
        }
        if users.values().any(|u| {
            u.id != user.id && (u.email == user.email || u.username == user.username)
        }) {
            return Err(BookStoreError::already_exists("User", user.email.clone()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> BookStoreResult<()> {
        let mut users = self.users.write().await;
        if users.remove(&id).is_none() {
            return Err(BookStoreError::not_found("User", id.to_string()));
        }

        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|_, book| book.user_id != id);
        tracing::debug!(user_id = %id, removed = before - books.len(), "Removed books of deleted user");

        self.password_resets.write().await.remove(&id);
        Ok(())
    }

    // =========================================================================
    // Book operations
    // =========================================================================

    async fn create_book(&self, book: Book) -> BookStoreResult<Book> {
        // Held until the insert so a concurrent delete_user cannot orphan the book.
        let users = self.users.read().await;
        if !users.contains_key(&book.user_id) {
            return Err(BookStoreError::not_found("User", book.user_id.to_string()));
        }

        let mut books = self.books.write().await;
        if books.contains_key(&book.id) {
            return Err(BookStoreError::already_exists("Book", book.id.to_string()));
        }
        if books
            .values()
            .any(|b| b.user_id == book.user_id && b.isbn == book.isbn)
        {
            return Err(BookStoreError::already_exists("Book", book.isbn.clone()));
        }
        books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get_book(&self, id: Uuid) -> BookStoreResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.get(&id).cloned())
    }

    async fn get_book_by_isbn(&self, user_id: Uuid, isbn: &str) -> BookStoreResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books
            .values()
            .find(|b| b.user_id == user_id && b.isbn == isbn)
            .cloned())
    }

    async fn list_books(&self, filter: BookFilter) -> BookStoreResult<(Vec<Book>, u32)> {
        let books = self.books.read().await;
        let mut result: Vec<Book> = books
            .values()
            .filter(|b| {
                let mut matches = true;
                if let Some(user_id) = filter.user_id {
                    matches = matches && b.user_id == user_id;
                }
                if let Some(status) = filter.status {
                    matches = matches && b.status() == status;
                }
                matches
            })
            .cloned()
            .collect();

        // Stable tie-break before the requested order.
        result.sort_by_key(|b| b.id);
        filter.effective_sort().sort(&mut result);

        let total = result.len() as u32;

        if let Some(offset) = filter.offset {
            result = result.into_iter().skip(offset as usize).collect();
        }
        if let Some(limit) = filter.limit {
            result = result.into_iter().take(limit as usize).collect();
        }

        Ok((result, total))
    }

    async fn update_book(&self, book: Book) -> BookStoreResult<Book> {
        let mut books = self.books.write().await;
        if !books.contains_key(&book.id) {
            return Err(BookStoreError::not_found("Book", book.id.to_string()));
        }
        if books
            .values()
            .any(|b| b.id != book.id && b.user_id == book.user_id && b.isbn == book.isbn)
        {
            return Err(BookStoreError::already_exists("Book", book.isbn.clone()));
        }
        books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn delete_book(&self, id: Uuid) -> BookStoreResult<()> {
        let mut books = self.books.write().await;
        if books.remove(&id).is_none() {
            return Err(BookStoreError::not_found("Book", id.to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // Password reset operations
    // =========================================================================

    async fn put_password_reset(&self, reset: PasswordReset) -> BookStoreResult<()> {
        let users = self.users.read().await;
        if !users.contains_key(&reset.user_id) {
            return Err(BookStoreError::not_found("User", reset.user_id.to_string()));
        }
        let mut resets = self.password_resets.write().await;
        resets.insert(reset.user_id, reset);
        Ok(())
    }

    async fn take_password_reset(
        &self,
        token_hash: &str,
    ) -> BookStoreResult<Option<PasswordReset>> {
        let mut resets = self.password_resets.write().await;
        let user_id = resets
            .values()
            .find(|r| r.token_hash == token_hash)
            .map(|r| r.user_id);
        Ok(user_id.and_then(|id| resets.remove(&id)))
    }
}
