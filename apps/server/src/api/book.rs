//! Book API endpoints.

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode};
use book_store::{BookFilter, BookStore};
use chrono::{NaiveDate, Utc};
use entities::{Book, LibrarySummary};
use protocol::{requests::*, responses::*};
use reading_progress::{ReadingError, ReadingEvent, ensure_not_future, validate_details};
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;

/// Latest calendar date any client can currently be on.
///
/// Dates arrive without a timezone, so the UTC date plus one day is the
/// bound for the future-date check. A client east of UTC may already be on
/// tomorrow's UTC date.
fn today() -> NaiveDate {
    let utc_today = Utc::now().date_naive();
    utc_today.succ_opt().unwrap_or(utc_today)
}

/// Returns the trimmed value of a mandatory text field.
fn required(value: Option<String>, field: &'static str) -> ServerResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ServerError::Reading(ReadingError::MissingRequiredField(field)))
}

/// Loads a book owned by `user`. Other users' books look absent.
async fn owned_book<S: BookStore>(
    state: &AppState<S>,
    user: &AuthenticatedUser,
    book_id: Uuid,
) -> ServerResult<Book> {
    match state.store.get_book(book_id).await? {
        Some(book) if book.user_id == user.id => Ok(book),
        _ => Err(ServerError::NotFound("Book".to_string())),
    }
}

/// Applies a reading event to one of the caller's books and saves it.
async fn apply_event<S: BookStore>(
    state: &AppState<S>,
    user: &AuthenticatedUser,
    book_id: Uuid,
    event: ReadingEvent,
) -> ServerResult<Book> {
    let book = owned_book(state, user, book_id).await?;
    let from = book.status();

    let mut next = reading_progress::apply(&book, event)?;
    next.touch();
    let next = state.store.update_book(next).await?;

    tracing::info!(
        book_id = %next.id,
        from = %from,
        to = %next.status(),
        progress = next.reading.progress,
        "Reading state updated"
    );
    Ok(next)
}

/// Adds a book to the caller's library.
pub async fn create_book<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<CreateBookRequest>,
) -> ServerResult<(StatusCode, Json<BookResponse>)> {
    let title = required(request.title, "title")?;
    let author = required(request.author, "author")?;
    let isbn = required(request.isbn, "isbn")?;
    let pages = request
        .pages
        .ok_or(ReadingError::MissingRequiredField("pages"))?;

    let today = today();
    ensure_not_future("startDate", request.start_date, today)?;
    ensure_not_future("endDate", request.end_date, today)?;
    validate_details(request.rating, request.notes.as_deref())?;

    let reading = reading_progress::create(
        request.status.unwrap_or_default(),
        pages,
        request.current_pages,
        request.start_date,
        request.end_date,
    )?;

    let mut book = Book::new(user.id, title, author, isbn).with_reading(reading);
    book.description = request.description;
    book.published_date = request.published_date;
    book.image = request.image;
    book.language = request.language;
    book.publisher = request.publisher;
    book.rating = request.rating;
    book.notes = request.notes;
    book.priority = request.priority;
    book.genre = request.genre;

    let book = state.store.create_book(book).await?;
    tracing::info!(
        book_id = %book.id,
        user_id = %user.id,
        status = %book.status(),
        "Book created"
    );

    Ok((
        StatusCode::CREATED,
        Json(BookResponse::with_message(book, "Book created")),
    ))
}

/// Lists the caller's books with shelf counts.
pub async fn list_books<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<ListBooksRequest>,
) -> ServerResult<Json<ListBooksResponse>> {
    let filter = BookFilter {
        user_id: Some(user.id),
        status: request.status,
        sort: request.sort,
        limit: request.limit,
        offset: request.offset,
    };
    let (books, total) = state.store.list_books(filter).await?;

    let summary = if request.status.is_none() && request.limit.is_none() && request.offset.is_none()
    {
        LibrarySummary::from_books(&books)
    } else {
        let (all, _) = state.store.list_books(BookFilter::for_user(user.id)).await?;
        LibrarySummary::from_books(&all)
    };

    Ok(Json(ListBooksResponse {
        success: true,
        books,
        total,
        summary,
    }))
}

/// Gets one of the caller's books.
pub async fn get_book<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<GetBookRequest>,
) -> ServerResult<Json<BookResponse>> {
    let book = owned_book(&state, &user, request.book_id).await?;
    Ok(Json(BookResponse::new(book)))
}

/// Moves a to-read book onto the reading shelf.
pub async fn start_reading<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<StartReadingRequest>,
) -> ServerResult<Json<BookResponse>> {
    ensure_not_future("startDate", Some(request.start_date), today())?;

    let event = ReadingEvent::Start {
        start_date: request.start_date,
        current_page: request.current_page,
        total_pages: request.total_pages,
    };
    let book = apply_event(&state, &user, request.book_id, event).await?;

    Ok(Json(BookResponse::with_message(book, "Reading started")))
}

/// Records the page the caller is on.
pub async fn update_progress<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<UpdateProgressRequest>,
) -> ServerResult<Json<BookResponse>> {
    let event = ReadingEvent::UpdateProgress {
        current_page: request.current_page,
    };
    let book = apply_event(&state, &user, request.book_id, event).await?;

    Ok(Json(BookResponse::with_message(book, "Progress updated")))
}

/// Marks a book as read.
pub async fn finish_reading<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<FinishReadingRequest>,
) -> ServerResult<Json<BookResponse>> {
    ensure_not_future("endDate", Some(request.end_date), today())?;

    let event = ReadingEvent::Finish {
        end_date: request.end_date,
    };
    let book = apply_event(&state, &user, request.book_id, event).await?;

    Ok(Json(BookResponse::with_message(book, "Book finished")))
}

/// Edits rating, notes, priority and genres.
pub async fn update_details<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<UpdateBookDetailsRequest>,
) -> ServerResult<Json<BookResponse>> {
    validate_details(request.rating, request.notes.as_deref())?;

    let mut book = owned_book(&state, &user, request.book_id).await?;
    if let Some(rating) = request.rating {
        book.rating = Some(rating);
    }
    if let Some(notes) = request.notes {
        book.notes = Some(notes).filter(|n| !n.is_empty());
    }
    if let Some(priority) = request.priority {
        book.priority = Some(priority);
    }
    if let Some(genre) = request.genre {
        book.genre = genre;
    }
    book.touch();

    let book = state.store.update_book(book).await?;
    tracing::debug!(book_id = %book.id, "Book details updated");

    Ok(Json(BookResponse::with_message(book, "Book updated")))
}

/// Removes a book from the caller's library.
pub async fn delete_book<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<DeleteBookRequest>,
) -> ServerResult<Json<MessageResponse>> {
    let book = owned_book(&state, &user, request.book_id).await?;
    state.store.delete_book(book.id).await?;
    tracing::info!(book_id = %book.id, user_id = %user.id, "Book deleted");

    Ok(Json(MessageResponse::new("Book deleted")))
}
