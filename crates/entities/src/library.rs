//! Library view helpers: sort orders and per-status counts.

use serde::{Deserialize, Serialize};

use crate::{Book, ReadingStatus};

/// Sort order for a list of books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum BookSort {
    #[default]
    Title,
    Author,
    /// Most recently added first.
    AddedDate,
    /// Highest rating first.
    Rating,
    /// Most recently finished first.
    DateRead,
    /// Most progress first.
    Progress,
    /// Most recently started first.
    StartedDate,
}

impl BookSort {
    /// Default order for a shelf of books in `status`.
    pub fn default_for(status: Option<ReadingStatus>) -> Self {
        match status {
            Some(ReadingStatus::Read) => Self::DateRead,
            Some(ReadingStatus::Reading) => Self::Progress,
            Some(ReadingStatus::ToRead) => Self::AddedDate,
            None => Self::Title,
        }
    }

    /// Sorts books in place. Missing values sort last.
    pub fn sort(self, books: &mut [Book]) {
        match self {
            Self::Title => books.sort_by(|a, b| a.title.cmp(&b.title)),
            Self::Author => books.sort_by(|a, b| a.author.cmp(&b.author)),
            Self::AddedDate => books.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Self::Rating => books.sort_by(|a, b| b.rating.cmp(&a.rating)),
            Self::DateRead => {
                books.sort_by(|a, b| b.reading.end_date.cmp(&a.reading.end_date))
            }
            Self::Progress => books.sort_by(|a, b| b.reading.progress.cmp(&a.reading.progress)),
            Self::StartedDate => {
                books.sort_by(|a, b| b.reading.start_date.cmp(&a.reading.start_date))
            }
        }
    }
}

/// Number of books on each shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySummary {
    pub read: u32,
    pub reading: u32,
    pub to_read: u32,
}

impl LibrarySummary {
    /// Counts books by status.
    pub fn from_books<'a>(books: impl IntoIterator<Item = &'a Book>) -> Self {
        books
            .into_iter()
            .fold(Self::default(), |mut summary, book| {
                match book.status() {
                    ReadingStatus::Read => summary.read += 1,
                    ReadingStatus::Reading => summary.reading += 1,
                    ReadingStatus::ToRead => summary.to_read += 1,
                }
                summary
            })
    }
}
