//! Behaviour every `BookStore` implementation must share.

use chrono::{Duration, NaiveDate, Utc};
use entities::{Book, BookPriority, BookSort, PasswordReset, ReadingState, ReadingStatus, User};

use crate::{BookFilter, BookStore, BookStoreError};

fn reading(status: ReadingStatus, pages: u32, current_pages: u32, progress: u8) -> ReadingState {
    ReadingState {
        status,
        pages,
        current_pages,
        progress,
        ..Default::default()
    }
}

async fn user<S: BookStore>(store: &S, username: &str) -> User {
    store
        .create_user(User::new(username, format!("{username}@example.com"), "hash"))
        .await
        .unwrap()
}

pub async fn user_crud<S: BookStore>(store: &S) {
    // Create
    let created = store
        .create_user(
            User::new("reader", "reader@example.com", "hash")
                .with_name("Ana")
                .with_last_name("Lima"),
        )
        .await
        .unwrap();

    // Get
    let fetched = store.get_user(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.username, "reader");
    assert_eq!(fetched.last_name.as_deref(), Some("Lima"));
    assert_eq!(fetched.password_hash, "hash");
    assert!(store.get_user_by_email("reader@example.com").await.unwrap().is_some());
    assert!(store.get_user_by_username("reader").await.unwrap().is_some());
    assert!(store.get_user_by_username("nobody").await.unwrap().is_none());

    // Duplicates
    let result = store
        .create_user(User::new("other", "reader@example.com", "hash"))
        .await;
    assert!(matches!(result, Err(BookStoreError::AlreadyExists { .. })));
    let result = store
        .create_user(User::new("reader", "other@example.com", "hash"))
        .await;
    assert!(matches!(result, Err(BookStoreError::AlreadyExists { .. })));

    // Update
    let mut changed = fetched.clone();
    changed.name = Some("Ana Paula".to_string());
    store.update_user(changed).await.unwrap();
    let fetched = store.get_user(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.name.as_deref(), Some("Ana Paula"));

    // Delete
    store.delete_user(created.id).await.unwrap();
    assert!(store.get_user(created.id).await.unwrap().is_none());
    assert!(matches!(
        store.delete_user(created.id).await,
        Err(BookStoreError::NotFound { .. })
    ));
}

pub async fn book_crud<S: BookStore>(store: &S) {
    let owner = user(store, "reader").await;

    // Create
    let mut book = Book::new(owner.id, "Dune", "Frank Herbert", "9780441013593")
        .with_genre("sci-fi")
        .with_genre("classic")
        .with_rating(4)
        .with_reading(ReadingState {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..reading(ReadingStatus::Reading, 300, 150, 50)
        });
    book.priority = Some(BookPriority::High);
    book.published_date = NaiveDate::from_ymd_opt(1965, 8, 1);
    let created = store.create_book(book).await.unwrap();

    // Get
    let fetched = store.get_book(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Dune");
    assert_eq!(fetched.reading, created.reading);
    assert_eq!(fetched.genre, created.genre);
    assert_eq!(fetched.priority, Some(BookPriority::High));
    assert_eq!(fetched.rating, Some(4));
    assert_eq!(fetched.published_date, NaiveDate::from_ymd_opt(1965, 8, 1));

    // Update
    let mut changed = fetched.clone();
    changed.reading.current_pages = 300;
    changed.reading.progress = 100;
    changed.notes = Some("Loved it".to_string());
    store.update_book(changed).await.unwrap();
    let fetched = store.get_book(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.reading.progress, 100);
    assert_eq!(fetched.notes.as_deref(), Some("Loved it"));

    // Delete
    store.delete_book(created.id).await.unwrap();
    assert!(store.get_book(created.id).await.unwrap().is_none());
    assert!(matches!(
        store.delete_book(created.id).await,
        Err(BookStoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.update_book(created).await,
        Err(BookStoreError::NotFound { .. })
    ));
}

pub async fn isbn_unique_per_user<S: BookStore>(store: &S) {
    let first = user(store, "first").await;
    let second = user(store, "second").await;

    store
        .create_book(Book::new(first.id, "Dune", "Frank Herbert", "isbn-1"))
        .await
        .unwrap();

    let duplicate = store
        .create_book(Book::new(first.id, "Dune again", "Frank Herbert", "isbn-1"))
        .await;
    assert!(matches!(duplicate, Err(BookStoreError::AlreadyExists { .. })));

    store
        .create_book(Book::new(second.id, "Dune", "Frank Herbert", "isbn-1"))
        .await
        .unwrap();

    let found = store.get_book_by_isbn(second.id, "isbn-1").await.unwrap().unwrap();
    assert_eq!(found.user_id, second.id);
    assert!(store.get_book_by_isbn(second.id, "isbn-2").await.unwrap().is_none());
}

pub async fn list_filters_and_sorts<S: BookStore>(store: &S) {
    let owner = user(store, "reader").await;
    let stranger = user(store, "stranger").await;

    for (title, status, progress) in [
        ("Anathem", ReadingStatus::Reading, 20),
        ("Blindsight", ReadingStatus::Reading, 80),
        ("Consider Phlebas", ReadingStatus::Reading, 50),
        ("Dhalgren", ReadingStatus::ToRead, 0),
        ("Excession", ReadingStatus::Read, 100),
    ] {
        let book = Book::new(owner.id, title, "Author", title)
            .with_reading(reading(status, 100, progress as u32, progress));
        store.create_book(book).await.unwrap();
    }
    store
        .create_book(Book::new(stranger.id, "Foundation", "Asimov", "f"))
        .await
        .unwrap();

    let (books, total) = store.list_books(BookFilter::for_user(owner.id)).await.unwrap();
    assert_eq!(total, 5);
    let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(
        titles,
        ["Anathem", "Blindsight", "Consider Phlebas", "Dhalgren", "Excession"]
    );

    // Reading shelf sorts by progress by default.
    let filter = BookFilter::for_user(owner.id).with_status(ReadingStatus::Reading);
    let (books, total) = store.list_books(filter).await.unwrap();
    assert_eq!(total, 3);
    let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["Blindsight", "Consider Phlebas", "Anathem"]);

    // Pagination keeps the total.
    let filter = BookFilter {
        user_id: Some(owner.id),
        sort: Some(BookSort::Title),
        limit: Some(2),
        offset: Some(1),
        ..Default::default()
    };
    let (books, total) = store.list_books(filter).await.unwrap();
    assert_eq!(total, 5);
    let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["Blindsight", "Consider Phlebas"]);
}

pub async fn delete_user_cascades<S: BookStore>(store: &S) {
    let owner = user(store, "reader").await;
    let other = user(store, "other").await;
    store
        .create_book(Book::new(owner.id, "Dune", "Frank Herbert", "isbn-1"))
        .await
        .unwrap();
    store
        .create_book(Book::new(other.id, "Emma", "Jane Austen", "isbn-2"))
        .await
        .unwrap();
    store
        .put_password_reset(PasswordReset::new(owner.id, "hash-1", Utc::now() + Duration::hours(1)))
        .await
        .unwrap();

    store.delete_user(owner.id).await.unwrap();

    let (books, total) = store.list_books(BookFilter::for_user(owner.id)).await.unwrap();
    assert!(books.is_empty());
    assert_eq!(total, 0);
    assert!(store.take_password_reset("hash-1").await.unwrap().is_none());

    let (_, total) = store.list_books(BookFilter::for_user(other.id)).await.unwrap();
    assert_eq!(total, 1);
}

pub async fn password_reset_is_single_use<S: BookStore>(store: &S) {
    let owner = user(store, "reader").await;
    let expires_at = Utc::now() + Duration::hours(1);

    store
        .put_password_reset(PasswordReset::new(owner.id, "old-hash", expires_at))
        .await
        .unwrap();
    // A newer request replaces the old one.
    store
        .put_password_reset(PasswordReset::new(owner.id, "new-hash", expires_at))
        .await
        .unwrap();
    assert!(store.take_password_reset("old-hash").await.unwrap().is_none());

    let reset = store.take_password_reset("new-hash").await.unwrap().unwrap();
    assert_eq!(reset.user_id, owner.id);
    assert!(store.take_password_reset("new-hash").await.unwrap().is_none());
}
