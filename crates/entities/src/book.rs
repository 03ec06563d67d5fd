//! Book entity definitions.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reading lifecycle stage of a book for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    /// On the shelf, not started.
    #[default]
    ToRead,
    /// Currently being read.
    Reading,
    /// Finished.
    Read,
}

impl ReadingStatus {
    /// Converts the status to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToRead => "to-read",
            Self::Reading => "reading",
            Self::Read => "read",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "to-read" => Some(Self::ToRead),
            "reading" => Some(Self::Reading),
            "read" => Some(Self::Read),
            _ => None,
        }
    }

    /// Returns true if a book may move from this status to `next`.
    ///
    /// Progress updates keep a book in `Reading`, so that self-transition is
    /// allowed; every other edge moves strictly forward.
    pub fn can_transition_to(&self, next: ReadingStatus) -> bool {
        matches!(
            (self, next),
            (Self::ToRead, Self::Reading)
                | (Self::Reading, Self::Reading)
                | (Self::Reading, Self::Read)
        )
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently the user wants to read a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookPriority {
    #[serde(alias = "alta")]
    High,
    #[serde(alias = "média", alias = "media")]
    Medium,
    #[serde(alias = "baixa")]
    Low,
}

impl BookPriority {
    /// Converts the priority to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parses a priority from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Reading progress fields of a book.
///
/// `progress` and `days_to_read` are derived; only the reading progress
/// manager should write them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReadingState {
    /// Current lifecycle stage.
    pub status: ReadingStatus,
    /// Total number of pages.
    pub pages: u32,
    /// Pages read so far.
    pub current_pages: u32,
    /// Percentage of pages read, 0 to 100.
    pub progress: u8,
    /// Day the user started reading.
    pub start_date: Option<NaiveDate>,
    /// Day the user finished reading.
    pub end_date: Option<NaiveDate>,
    /// Whole days between start and end.
    pub days_to_read: Option<u32>,
}

/// A book in a user's library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    pub title: String,
    pub author: String,
    /// ISBN, unique per user.
    pub isbn: String,
    pub description: Option<String>,
    pub published_date: Option<NaiveDate>,
    /// Cover image URL.
    pub image: Option<String>,
    pub language: Option<String>,
    pub publisher: Option<String>,
    /// Rating from 0 to 5.
    pub rating: Option<u8>,
    /// Short personal notes (at most 150 characters).
    pub notes: Option<String>,
    pub priority: Option<BookPriority>,
    pub genre: BTreeSet<String>,
    /// Reading progress.
    #[serde(flatten)]
    pub reading: ReadingState,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Creates a new to-read book with no progress.
    pub fn new(
        user_id: Uuid,
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            description: None,
            published_date: None,
            image: None,
            language: None,
            publisher: None,
            rating: None,
            notes: None,
            priority: None,
            genre: BTreeSet::new(),
            reading: ReadingState::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the reading state.
    pub fn with_reading(mut self, reading: ReadingState) -> Self {
        self.reading = reading;
        self
    }

    /// Sets the rating.
    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Adds a genre.
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre.insert(genre.into());
        self
    }

    /// Returns the current status.
    pub fn status(&self) -> ReadingStatus {
        self.reading.status
    }

    /// Marks the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
