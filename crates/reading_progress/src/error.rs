//! Reading progress error types.

use chrono::NaiveDate;
use entities::ReadingStatus;
use thiserror::Error;

/// Errors returned when a reading mutation is rejected.
///
/// A rejected mutation never changes the input record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadingError {
    /// The book's status does not allow the requested event.
    #[error("Cannot move a book from {from} to {to}")]
    InvalidTransition {
        from: ReadingStatus,
        to: ReadingStatus,
    },

    /// A page number outside `0..=pages`, or a non-positive page count.
    #[error("Page {page} is out of range for a book with {pages} pages")]
    PageOutOfRange { page: u32, pages: u32 },

    /// The end date precedes the start date.
    #[error("End date {end} cannot be before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// A field the operation needs is absent.
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// Rating above the maximum.
    #[error("Rating must be between 0 and {max}, got {rating}")]
    RatingOutOfRange { rating: u8, max: u8 },

    /// Notes longer than allowed.
    #[error("Notes cannot exceed {max} characters, got {len}")]
    NotesTooLong { len: usize, max: usize },

    /// A reading date lies after today.
    #[error("{field} cannot be in the future: {date}")]
    FutureDate { field: &'static str, date: NaiveDate },
}

/// Result type for reading progress operations.
pub type ReadingResult<T> = Result<T, ReadingError>;
