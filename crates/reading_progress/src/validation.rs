//! Derived-field arithmetic and field validation.

use chrono::NaiveDate;

use crate::{ReadingError, ReadingResult};

/// Highest rating a book can receive.
pub const MAX_RATING: u8 = 5;

/// Maximum length of a book's notes, in characters.
pub const MAX_NOTES_LEN: usize = 150;

/// Percentage of `total` covered by `current`, rounded half up.
///
/// Callers guarantee `0 < total` and `current <= total`; a zero total
/// yields 0.
pub fn progress_percent(current: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let current = u64::from(current.min(total));
    let total = u64::from(total);
    // round(current / total * 100) without floats: floor((200c + t) / 2t)
    ((200 * current + total) / (2 * total)) as u8
}

/// Whole days from `start` to `end`.
///
/// Fails with `InvalidDateRange` when `end` precedes `start`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> ReadingResult<u32> {
    if end < start {
        return Err(ReadingError::InvalidDateRange { start, end });
    }
    Ok((end - start).num_days() as u32)
}

/// Checks `page` against a book of `pages` pages.
pub fn check_page(page: u32, pages: u32) -> ReadingResult<()> {
    if pages == 0 || page > pages {
        return Err(ReadingError::PageOutOfRange { page, pages });
    }
    Ok(())
}

/// Validates the user-editable details of a book.
pub fn validate_details(rating: Option<u8>, notes: Option<&str>) -> ReadingResult<()> {
    if let Some(rating) = rating {
        if rating > MAX_RATING {
            return Err(ReadingError::RatingOutOfRange {
                rating,
                max: MAX_RATING,
            });
        }
    }
    if let Some(notes) = notes {
        let len = notes.chars().count();
        if len > MAX_NOTES_LEN {
            return Err(ReadingError::NotesTooLong {
                len,
                max: MAX_NOTES_LEN,
            });
        }
    }
    Ok(())
}

/// Rejects reading dates after `today`.
pub fn ensure_not_future(
    field: &'static str,
    date: Option<NaiveDate>,
    today: NaiveDate,
) -> ReadingResult<()> {
    match date {
        Some(date) if date > today => Err(ReadingError::FutureDate { field, date }),
        _ => Ok(()),
    }
}
