//! Reading lifecycle transitions.
//!
//! A book moves `to-read -> reading -> read`. Each event has its own
//! transition function; [`apply`] dispatches a [`ReadingEvent`] to the right
//! one. All functions borrow the input and return a new record, so a failed
//! transition leaves the caller's book untouched.

use chrono::NaiveDate;
use entities::{Book, ReadingState, ReadingStatus};
use serde::{Deserialize, Serialize};

use crate::{ReadingError, ReadingResult, check_page, days_between, progress_percent};

/// A requested change to a book's reading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ReadingEvent {
    /// The user picks up a book from the to-read shelf.
    Start {
        start_date: NaiveDate,
        current_page: u32,
        total_pages: u32,
    },
    /// The user reports the page they are on.
    UpdateProgress { current_page: u32 },
    /// The user finished the book.
    Finish { end_date: NaiveDate },
}

/// Builds the reading state of a newly registered book.
///
/// The page count must be positive and `current_pages`, when given, must not
/// exceed it. A book registered as `read` always has every page read. Days to
/// read are only derived when both dates are known.
pub fn create(
    status: ReadingStatus,
    pages: u32,
    current_pages: Option<u32>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> ReadingResult<ReadingState> {
    let mut current = current_pages.unwrap_or(0);
    check_page(current, pages)?;

    let days_to_read = match (start_date, end_date) {
        (Some(start), Some(end)) => Some(days_between(start, end)?),
        _ => None,
    };

    if status == ReadingStatus::Read {
        current = pages;
    }

    Ok(ReadingState {
        status,
        pages,
        current_pages: current,
        progress: progress_percent(current, pages),
        start_date,
        end_date,
        days_to_read,
    })
}

/// Moves a to-read book onto the reading shelf.
pub fn start_reading(
    book: &Book,
    start_date: NaiveDate,
    current_page: u32,
    total_pages: u32,
) -> ReadingResult<Book> {
    require_transition(book, ReadingStatus::Reading, ReadingStatus::ToRead)?;
    check_page(current_page, total_pages)?;

    let mut next = book.clone();
    next.reading = ReadingState {
        status: ReadingStatus::Reading,
        pages: total_pages,
        current_pages: current_page,
        progress: progress_percent(current_page, total_pages),
        start_date: Some(start_date),
        end_date: None,
        days_to_read: None,
    };
    Ok(next)
}

/// Records the page a reader is on.
///
/// The book stays in `reading` even at 100%; finishing is a separate event.
pub fn update_progress(book: &Book, current_page: u32) -> ReadingResult<Book> {
    require_transition(book, ReadingStatus::Reading, ReadingStatus::Reading)?;
    check_page(current_page, book.reading.pages)?;

    let mut next = book.clone();
    next.reading.current_pages = current_page;
    next.reading.progress = progress_percent(current_page, book.reading.pages);
    Ok(next)
}

/// Marks a book as read on `end_date`.
pub fn finish_reading(book: &Book, end_date: NaiveDate) -> ReadingResult<Book> {
    require_transition(book, ReadingStatus::Read, ReadingStatus::Reading)?;
    let start_date = book
        .reading
        .start_date
        .ok_or(ReadingError::MissingRequiredField("startDate"))?;
    let days_to_read = days_between(start_date, end_date)?;

    let mut next = book.clone();
    next.reading.status = ReadingStatus::Read;
    next.reading.end_date = Some(end_date);
    next.reading.days_to_read = Some(days_to_read);
    next.reading.current_pages = next.reading.pages;
    next.reading.progress = 100;
    Ok(next)
}

/// Applies `event` to `book`.
pub fn apply(book: &Book, event: ReadingEvent) -> ReadingResult<Book> {
    match event {
        ReadingEvent::Start {
            start_date,
            current_page,
            total_pages,
        } => start_reading(book, start_date, current_page, total_pages),
        ReadingEvent::UpdateProgress { current_page } => update_progress(book, current_page),
        ReadingEvent::Finish { end_date } => finish_reading(book, end_date),
    }
}

// `expected` is the only status the event may start from.
fn require_transition(
    book: &Book,
    to: ReadingStatus,
    expected: ReadingStatus,
) -> ReadingResult<()> {
    let from = book.status();
    if from == expected && from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ReadingError::InvalidTransition { from, to })
    }
}
