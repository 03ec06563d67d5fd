//! SQLite book store implementation.

use std::{collections::BTreeSet, str::FromStr};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use entities::{
    Book, BookPriority, BookSort, PasswordReset, ReadingState, ReadingStatus, User,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, Pool, QueryBuilder, Sqlite,
};
use uuid::Uuid;

use crate::{BookFilter, BookStore, BookStoreError, BookStoreResult};

/// Database schema. Foreign keys cascade account deletion to books and
/// password resets.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    name TEXT,
    last_name TEXT,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    isbn TEXT NOT NULL,
    description TEXT,
    published_date TEXT,
    image TEXT,
    language TEXT,
    publisher TEXT,
    rating INTEGER,
    notes TEXT,
    priority TEXT,
    genre TEXT NOT NULL DEFAULT '[]',
    status TEXT NOT NULL,
    pages INTEGER NOT NULL,
    current_pages INTEGER NOT NULL DEFAULT 0,
    progress INTEGER NOT NULL DEFAULT 0,
    start_date TEXT,
    end_date TEXT,
    days_to_read INTEGER,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (user_id, isbn)
);

CREATE INDEX IF NOT EXISTS idx_books_user_status ON books (user_id, status);

CREATE TABLE IF NOT EXISTS password_resets (
    user_id TEXT PRIMARY KEY NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token_hash TEXT NOT NULL UNIQUE,
    expires_at TEXT NOT NULL
);
"#;

const BOOK_COLUMNS: &str = "id, user_id, title, author, isbn, description, published_date, \
     image, language, publisher, rating, notes, priority, genre, status, pages, current_pages, \
     progress, start_date, end_date, days_to_read, created_at, updated_at";

const USER_COLUMNS: &str =
    "id, username, email, name, last_name, password_hash, created_at, updated_at";

/// Book store backed by a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteBookStore {
    pool: Pool<Sqlite>,
}

impl SqliteBookStore {
    /// Opens (creating if missing) the database at `url` and applies the
    /// schema.
    pub async fn connect(url: &str) -> BookStoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` opens a separate database, so an
        // in-memory store must hold exactly one connection for its lifetime.
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Creates tables and indexes if they do not exist.
    async fn init(&self) -> BookStoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        tracing::info!("Book store schema ready");
        Ok(())
    }
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    name: Option<String>,
    last_name: Option<String>,
    password_hash: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = BookStoreError;

    fn try_from(row: UserRow) -> BookStoreResult<Self> {
        Ok(User {
            id: parse_uuid("users.id", &row.id)?,
            username: row.username,
            email: row.email,
            name: row.name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            created_at: parse_timestamp("users.created_at", &row.created_at)?,
            updated_at: parse_timestamp("users.updated_at", &row.updated_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct BookRow {
    id: String,
    user_id: String,
    title: String,
    author: String,
    isbn: String,
    description: Option<String>,
    published_date: Option<String>,
    image: Option<String>,
    language: Option<String>,
    publisher: Option<String>,
    rating: Option<i64>,
    notes: Option<String>,
    priority: Option<String>,
    genre: String,
    status: String,
    pages: i64,
    current_pages: i64,
    progress: i64,
    start_date: Option<String>,
    end_date: Option<String>,
    days_to_read: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<BookRow> for Book {
    type Error = BookStoreError;

    fn try_from(row: BookRow) -> BookStoreResult<Self> {
        let status = ReadingStatus::parse(&row.status)
            .ok_or_else(|| BookStoreError::corrupt("books.status", &row.status))?;
        let priority = row
            .priority
            .map(|p| {
                BookPriority::parse(&p).ok_or_else(|| BookStoreError::corrupt("books.priority", p))
            })
            .transpose()?;
        let genre: BTreeSet<String> = serde_json::from_str(&row.genre)?;

        Ok(Book {
            id: parse_uuid("books.id", &row.id)?,
            user_id: parse_uuid("books.user_id", &row.user_id)?,
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            description: row.description,
            published_date: parse_date("books.published_date", row.published_date)?,
            image: row.image,
            language: row.language,
            publisher: row.publisher,
            rating: row.rating.map(|r| r as u8),
            notes: row.notes,
            priority,
            genre,
            reading: ReadingState {
                status,
                pages: row.pages as u32,
                current_pages: row.current_pages as u32,
                progress: row.progress as u8,
                start_date: parse_date("books.start_date", row.start_date)?,
                end_date: parse_date("books.end_date", row.end_date)?,
                days_to_read: row.days_to_read.map(|d| d as u32),
            },
            created_at: parse_timestamp("books.created_at", &row.created_at)?,
            updated_at: parse_timestamp("books.updated_at", &row.updated_at)?,
        })
    }
}

fn parse_uuid(column: &'static str, value: &str) -> BookStoreResult<Uuid> {
    value
        .parse()
        .map_err(|_| BookStoreError::corrupt(column, value))
}

fn parse_timestamp(column: &'static str, value: &str) -> BookStoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| BookStoreError::corrupt(column, value))
}

fn parse_date(column: &'static str, value: Option<String>) -> BookStoreResult<Option<NaiveDate>> {
    value
        .map(|v| v.parse().map_err(|_| BookStoreError::corrupt(column, v)))
        .transpose()
}

// Fixed-width so that stored timestamps order lexicographically.
fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn format_date(value: Option<NaiveDate>) -> Option<String> {
    value.map(|d| d.to_string())
}

fn order_by(sort: BookSort) -> &'static str {
    match sort {
        BookSort::Title => "title ASC, id ASC",
        BookSort::Author => "author ASC, id ASC",
        BookSort::AddedDate => "created_at DESC, id ASC",
        BookSort::Rating => "rating IS NULL, rating DESC, id ASC",
        BookSort::DateRead => "end_date IS NULL, end_date DESC, id ASC",
        BookSort::Progress => "progress DESC, id ASC",
        BookSort::StartedDate => "start_date IS NULL, start_date DESC, id ASC",
    }
}

fn push_filter<'a>(query: &mut QueryBuilder<'a, Sqlite>, filter: &BookFilter) {
    query.push(" WHERE 1 = 1");
    if let Some(user_id) = filter.user_id {
        query.push(" AND user_id = ").push_bind(user_id.to_string());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
}

/// Maps unique-constraint violations to `AlreadyExists`.
fn map_unique(entity_type: &'static str, id: &str) -> impl FnOnce(sqlx::Error) -> BookStoreError {
    let id = id.to_string();
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            BookStoreError::already_exists(entity_type, id)
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            BookStoreError::not_found("User", id)
        }
        _ => BookStoreError::Database(e),
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> BookStoreResult<User> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(format_timestamp(&user.created_at))
        .bind(format_timestamp(&user.updated_at))
        .execute(&self.pool)
        .await
        .map_err(map_unique("User", &user.email))?;

        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> BookStoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> BookStoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> BookStoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn update_user(&self, user: User) -> BookStoreResult<User> {
        let result = sqlx::query(
            "UPDATE users SET username = ?, email = ?, name = ?, last_name = ?,
             password_hash = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(format_timestamp(&user.updated_at))
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_unique("User", &user.email))?;

        if result.rows_affected() == 0 {
            return Err(BookStoreError::not_found("User", user.id.to_string()));
        }
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> BookStoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BookStoreError::not_found("User", id.to_string()));
        }
        tracing::debug!(user_id = %id, "Deleted user and cascaded records");
        Ok(())
    }

    // =========================================================================
    // Book operations
    // =========================================================================

    async fn create_book(&self, book: Book) -> BookStoreResult<Book> {
        let genre = serde_json::to_string(&book.genre)?;

        sqlx::query(&format!(
            "INSERT INTO books ({BOOK_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(book.id.to_string())
        .bind(book.user_id.to_string())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(format_date(book.published_date))
        .bind(&book.image)
        .bind(&book.language)
        .bind(&book.publisher)
        .bind(book.rating.map(i64::from))
        .bind(&book.notes)
        .bind(book.priority.map(|p| p.as_str()))
        .bind(genre)
        .bind(book.reading.status.as_str())
        .bind(i64::from(book.reading.pages))
        .bind(i64::from(book.reading.current_pages))
        .bind(i64::from(book.reading.progress))
        .bind(format_date(book.reading.start_date))
        .bind(format_date(book.reading.end_date))
        .bind(book.reading.days_to_read.map(i64::from))
        .bind(format_timestamp(&book.created_at))
        .bind(format_timestamp(&book.updated_at))
        .execute(&self.pool)
        .await
        .map_err(map_unique("Book", &book.isbn))?;

        Ok(book)
    }

    async fn get_book(&self, id: Uuid) -> BookStoreResult<Option<Book>> {
        let row: Option<BookRow> =
            sqlx::query_as(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Book::try_from).transpose()
    }

    async fn get_book_by_isbn(&self, user_id: Uuid, isbn: &str) -> BookStoreResult<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE user_id = ? AND isbn = ?"
        ))
        .bind(user_id.to_string())
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Book::try_from).transpose()
    }

    async fn list_books(&self, filter: BookFilter) -> BookStoreResult<(Vec<Book>, u32)> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM books");
        push_filter(&mut count, &filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {BOOK_COLUMNS} FROM books"));
        push_filter(&mut query, &filter);
        query.push(" ORDER BY ").push(order_by(filter.effective_sort()));
        if filter.limit.is_some() || filter.offset.is_some() {
            // SQLite needs a LIMIT before OFFSET; -1 means unbounded.
            query
                .push(" LIMIT ")
                .push_bind(filter.limit.map(i64::from).unwrap_or(-1))
                .push(" OFFSET ")
                .push_bind(i64::from(filter.offset.unwrap_or(0)));
        }

        let rows: Vec<BookRow> = query.build_query_as().fetch_all(&self.pool).await?;
        let books = rows
            .into_iter()
            .map(Book::try_from)
            .collect::<BookStoreResult<Vec<_>>>()?;

        Ok((books, total as u32))
    }

    async fn update_book(&self, book: Book) -> BookStoreResult<Book> {
        let genre = serde_json::to_string(&book.genre)?;

        let result = sqlx::query(
            "UPDATE books SET title = ?, author = ?, isbn = ?, description = ?,
             published_date = ?, image = ?, language = ?, publisher = ?, rating = ?,
             notes = ?, priority = ?, genre = ?, status = ?, pages = ?, current_pages = ?,
             progress = ?, start_date = ?, end_date = ?, days_to_read = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(format_date(book.published_date))
        .bind(&book.image)
        .bind(&book.language)
        .bind(&book.publisher)
        .bind(book.rating.map(i64::from))
        .bind(&book.notes)
        .bind(book.priority.map(|p| p.as_str()))
        .bind(genre)
        .bind(book.reading.status.as_str())
        .bind(i64::from(book.reading.pages))
        .bind(i64::from(book.reading.current_pages))
        .bind(i64::from(book.reading.progress))
        .bind(format_date(book.reading.start_date))
        .bind(format_date(book.reading.end_date))
        .bind(book.reading.days_to_read.map(i64::from))
        .bind(format_timestamp(&book.updated_at))
        .bind(book.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_unique("Book", &book.isbn))?;

        if result.rows_affected() == 0 {
            return Err(BookStoreError::not_found("Book", book.id.to_string()));
        }
        Ok(book)
    }

    async fn delete_book(&self, id: Uuid) -> BookStoreResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BookStoreError::not_found("Book", id.to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // Password reset operations
    // =========================================================================

    async fn put_password_reset(&self, reset: PasswordReset) -> BookStoreResult<()> {
        sqlx::query(
            "INSERT INTO password_resets (user_id, token_hash, expires_at)
             VALUES (?, ?, ?)
             ON CONFLICT (user_id) DO UPDATE SET
                 token_hash = excluded.token_hash,
                 expires_at = excluded.expires_at",
        )
        .bind(reset.user_id.to_string())
        .bind(&reset.token_hash)
        .bind(format_timestamp(&reset.expires_at))
        .execute(&self.pool)
        .await
        .map_err(map_unique("PasswordReset", &reset.user_id.to_string()))?;

        Ok(())
    }

    async fn take_password_reset(
        &self,
        token_hash: &str,
    ) -> BookStoreResult<Option<PasswordReset>> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            "DELETE FROM password_resets WHERE token_hash = ?
             RETURNING user_id, token_hash, expires_at",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(user_id, token_hash, expires_at)| {
            Ok(PasswordReset {
                user_id: parse_uuid("password_resets.user_id", &user_id)?,
                token_hash,
                expires_at: parse_timestamp("password_resets.expires_at", &expires_at)?,
            })
        })
        .transpose()
    }
}
