//! End-to-end tests for the HTTP API.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use auth::hash_reset_token;
use book_store::{BookStore, MemoryBookStore, SqliteBookStore};
use entities::User;
use readlog_server::{
    config::Config, create_app, create_state_with_mailer, error::ServerResult, services::Mailer,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

const PASSWORD: &str = "correct horse battery";

#[derive(Default)]
struct RecordingMailer {
    links: Mutex<Vec<String>>,
}

impl RecordingMailer {
    fn last_token(&self) -> Option<String> {
        let links = self.links.lock().unwrap();
        links
            .last()
            .and_then(|link| link.split("token=").nth(1))
            .map(str::to_string)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, _user: &User, reset_link: &str) -> ServerResult<()> {
        self.links.lock().unwrap().push(reset_link.to_string());
        Ok(())
    }
}

struct TestApp {
    app: Router,
    mailer: Arc<RecordingMailer>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_store(MemoryBookStore::new())
    }

    fn with_store<S: BookStore + 'static>(store: S) -> Self {
        Self::with_config(test_config(), store).0
    }

    /// Builds an app over `store` and also returns its state.
    fn with_config<S: BookStore + 'static>(config: Config, store: S) -> (Self, Arc<AppState<S>>) {
        let mailer = Arc::new(RecordingMailer::default());
        let state = create_state_with_mailer(config, store, mailer.clone());

        let app = Self {
            app: create_app(state.clone()),
            mailer,
        };
        (app, state)
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(method, uri, token, body.map(|body| body.to_string())).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        (status, value)
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Registers `username` and returns its access token.
    async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["accessToken"].as_str().unwrap().to_string()
    }

    /// Creates a book and returns it.
    async fn create_book(&self, token: &str, body: Value) -> Value {
        let (status, body) = self.post("/api/book/create", Some(token), body).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["book"].clone()
    }
}

fn test_config() -> Config {
    let mut config = Config::new("test-secret-key-must-be-long-enough-for-security");
    config.public_url = "http://readlog.test".to_string();
    config
}

fn assert_invalid_request(status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert!(body["message"].is_string());
}

fn dune() -> Value {
    json!({
        "title": "Dune",
        "author": "Frank Herbert",
        "isbn": "9780441013593",
        "pages": 300,
    })
}

// ============================================================================
// Health and auth
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new();
    let token = app.register("reader").await;

    let (status, body) = app
        .request(Method::GET, "/api/auth/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "reader");
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "Reader@Example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["accessToken"].is_string());

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "reader@example.com", "password": "wrong password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_passwords() {
    let app = TestApp::new();
    app.register("reader").await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "other", "email": "reader@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "USER_ALREADY_EXISTS");

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "weak", "email": "weak@example.com", "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "WEAK_PASSWORD");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();

    let (status, body) = app.post("/api/book/list", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTHENTICATION_REQUIRED");

    let (status, _) = app
        .post("/api/book/list", Some("not-a-jwt"), json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Books
// ============================================================================

#[tokio::test]
async fn test_create_book_validation() {
    let app = TestApp::new();
    let token = app.register("reader").await;

    let (status, body) = app
        .post(
            "/api/book/create",
            Some(&token),
            json!({ "title": "Dune", "isbn": "1", "pages": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_REQUIRED_FIELD");
    assert!(body["message"].as_str().unwrap().contains("author"));

    let mut future = dune();
    future["status"] = json!("reading");
    future["startDate"] = json!("2999-01-01");
    let (status, body) = app.post("/api/book/create", Some(&token), future).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "FUTURE_DATE");

    let mut rated = dune();
    rated["rating"] = json!(6);
    let (status, body) = app.post("/api/book/create", Some(&token), rated).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "RATING_OUT_OF_RANGE");
}

#[tokio::test]
async fn test_create_book_rejects_ill_typed_fields() {
    let app = TestApp::new();
    let token = app.register("reader").await;

    for (field, value) in [
        ("currentPages", json!(-5)),
        ("rating", json!(9000)),
        ("status", json!("finished")),
        ("startDate", json!("2024-13-45")),
        ("pages", json!("three hundred")),
    ] {
        let mut body = dune();
        body[field] = value;
        let (status, body) = app.post("/api/book/create", Some(&token), body).await;
        assert_invalid_request(status, &body);
    }

    let (_, body) = app.post("/api/book/list", Some(&token), json!({})).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let app = TestApp::new();
    let token = app.register("reader").await;
    let book = app.create_book(&token, dune()).await;

    let (status, body) = app
        .post(
            "/api/book/update-progress",
            Some(&token),
            json!({ "bookId": book["id"], "currentPage": -1 }),
        )
        .await;
    assert_invalid_request(status, &body);

    let (status, body) = app
        .post(
            "/api/book/finish-reading",
            Some(&token),
            json!({ "bookId": book["id"], "endDate": "yesterday" }),
        )
        .await;
    assert_invalid_request(status, &body);

    let (status, body) = app
        .post("/api/book/get", Some(&token), json!({ "bookId": "not-a-uuid" }))
        .await;
    assert_invalid_request(status, &body);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/book/create",
            Some(&token),
            Some("{\"title\": \"Dune\",".to_string()),
        )
        .await;
    assert_invalid_request(status, &body);

    let (status, body) = app
        .send(Method::POST, "/api/auth/login", None, Some("not json".to_string()))
        .await;
    assert_invalid_request(status, &body);
}

#[tokio::test]
async fn test_isbn_is_unique_per_user() {
    let app = TestApp::new();
    let first = app.register("first").await;
    let second = app.register("second").await;

    app.create_book(&first, dune()).await;

    let (status, body) = app.post("/api/book/create", Some(&first), dune()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_BOOK");

    app.create_book(&second, dune()).await;
}

#[tokio::test]
async fn test_create_as_read_fills_every_page() {
    let app = TestApp::new();
    let token = app.register("reader").await;

    let book = app
        .create_book(
            &token,
            json!({
                "title": "Emma",
                "author": "Jane Austen",
                "isbn": "9780141439587",
                "pages": 200,
                "currentPages": 20,
                "status": "read",
                "startDate": "2024-01-01",
                "endDate": "2024-01-11",
            }),
        )
        .await;

    assert_eq!(book["status"], "read");
    assert_eq!(book["currentPages"], 200);
    assert_eq!(book["progress"], 100);
    assert_eq!(book["daysToRead"], 10);
}

#[tokio::test]
async fn test_reading_lifecycle() {
    run_reading_lifecycle(TestApp::new()).await;
}

#[tokio::test]
async fn test_reading_lifecycle_on_sqlite() {
    let store = SqliteBookStore::connect("sqlite::memory:").await.unwrap();
    run_reading_lifecycle(TestApp::with_store(store)).await;
}

async fn run_reading_lifecycle(app: TestApp) {
    let token = app.register("reader").await;
    let book = app.create_book(&token, dune()).await;
    let book_id = book["id"].clone();
    assert_eq!(book["status"], "to-read");
    assert_eq!(book["progress"], 0);

    let (status, body) = app
        .post(
            "/api/book/start-reading",
            Some(&token),
            json!({
                "bookId": book_id,
                "startDate": "2024-01-01",
                "currentPage": 150,
                "totalPages": 300,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["book"]["status"], "reading");
    assert_eq!(body["book"]["progress"], 50);

    let (status, body) = app
        .post(
            "/api/book/update-progress",
            Some(&token),
            json!({ "bookId": book_id, "currentPage": 200 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["progress"], 67);

    let (status, body) = app
        .post(
            "/api/book/update-progress",
            Some(&token),
            json!({ "bookId": book_id, "currentPage": 301 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PAGE_OUT_OF_RANGE");

    let (status, body) = app
        .post(
            "/api/book/finish-reading",
            Some(&token),
            json!({ "bookId": book_id, "endDate": "2023-12-31" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_DATE_RANGE");

    // The rejected finish left the book untouched.
    let (_, body) = app
        .post("/api/book/get", Some(&token), json!({ "bookId": book_id }))
        .await;
    assert_eq!(body["book"]["status"], "reading");
    assert_eq!(body["book"]["currentPages"], 200);

    let (status, body) = app
        .post(
            "/api/book/finish-reading",
            Some(&token),
            json!({ "bookId": book_id, "endDate": "2024-01-11" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["status"], "read");
    assert_eq!(body["book"]["progress"], 100);
    assert_eq!(body["book"]["currentPages"], 300);
    assert_eq!(body["book"]["daysToRead"], 10);

    let (status, body) = app
        .post(
            "/api/book/start-reading",
            Some(&token),
            json!({
                "bookId": book_id,
                "startDate": "2024-02-01",
                "currentPage": 0,
                "totalPages": 300,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_books_of_other_users_are_hidden() {
    let app = TestApp::new();
    let owner = app.register("owner").await;
    let stranger = app.register("stranger").await;
    let book = app.create_book(&owner, dune()).await;

    for uri in ["/api/book/get", "/api/book/delete"] {
        let (status, body) = app
            .post(uri, Some(&stranger), json!({ "bookId": book["id"] }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
    }

    let (status, _) = app
        .post("/api/book/delete", Some(&owner), json!({ "bookId": book["id"] }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/book/get", Some(&owner), json!({ "bookId": book["id"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_books_with_summary() {
    let app = TestApp::new();
    let token = app.register("reader").await;

    for (isbn, status, current) in [("1", "to-read", 0), ("2", "reading", 10), ("3", "reading", 90)] {
        app.create_book(
            &token,
            json!({
                "title": format!("Book {isbn}"),
                "author": "Author",
                "isbn": isbn,
                "pages": 100,
                "currentPages": current,
                "status": status,
            }),
        )
        .await;
    }

    let (status, body) = app.post("/api/book/list", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["summary"], json!({ "read": 0, "reading": 2, "toRead": 1 }));

    let (_, body) = app
        .post("/api/book/list", Some(&token), json!({ "status": "reading" }))
        .await;
    assert_eq!(body["total"], 2);
    // Reading shelf defaults to most progress first.
    assert_eq!(body["books"][0]["isbn"], "3");
    assert_eq!(body["summary"]["toRead"], 1);

    let (_, body) = app
        .post(
            "/api/book/list",
            Some(&token),
            json!({ "sort": "title", "limit": 1, "offset": 1 }),
        )
        .await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["books"].as_array().unwrap().len(), 1);
    assert_eq!(body["books"][0]["title"], "Book 2");
}

#[tokio::test]
async fn test_update_details() {
    let app = TestApp::new();
    let token = app.register("reader").await;
    let book = app.create_book(&token, dune()).await;

    let (status, body) = app
        .post(
            "/api/book/update-details",
            Some(&token),
            json!({ "bookId": book["id"], "notes": "x".repeat(151) }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NOTES_TOO_LONG");

    let (status, body) = app
        .post(
            "/api/book/update-details",
            Some(&token),
            json!({
                "bookId": book["id"],
                "rating": 5,
                "notes": "Spice",
                "priority": "alta",
                "genre": ["sci-fi"],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["rating"], 5);
    assert_eq!(body["book"]["notes"], "Spice");
    assert_eq!(body["book"]["priority"], "high");
    assert_eq!(body["book"]["genre"], json!(["sci-fi"]));
}

// ============================================================================
// Profile and account
// ============================================================================

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new();
    let token = app.register("reader").await;
    app.register("taken").await;

    let (status, body) = app
        .post(
            "/api/profile/update",
            Some(&token),
            json!({ "name": "Ana", "lastName": "Lima" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Ana");
    assert_eq!(body["user"]["lastName"], "Lima");

    let (status, body) = app
        .post("/api/profile/update", Some(&token), json!({ "username": "taken" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "USER_ALREADY_EXISTS");

    let (_, body) = app.post("/api/profile/get", Some(&token), json!({})).await;
    assert_eq!(body["user"]["username"], "reader");
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new();
    let token = app.register("reader").await;

    let (status, body) = app
        .post(
            "/api/account/change-password",
            Some(&token),
            json!({
                "currentPassword": "not my password",
                "newPassword": "brand new password",
                "confirmPassword": "brand new password",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, body) = app
        .post(
            "/api/account/change-password",
            Some(&token),
            json!({
                "currentPassword": PASSWORD,
                "newPassword": "brand new password",
                "confirmPassword": "brand new passwort",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PASSWORD_MISMATCH");

    let (status, _) = app
        .post(
            "/api/account/change-password",
            Some(&token),
            json!({
                "currentPassword": PASSWORD,
                "newPassword": "brand new password",
                "confirmPassword": "brand new password",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "reader@example.com", "password": "brand new password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_account_removes_books() {
    let app = TestApp::new();
    let token = app.register("reader").await;
    let book = app.create_book(&token, dune()).await;

    let (status, _) = app
        .post("/api/account/delete", Some(&token), json!({ "password": "wrong one" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/account/delete", Some(&token), json!({ "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::OK);

    // The token outlives the account but no longer grants access.
    let (status, _) = app
        .request(Method::GET, "/api/auth/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Registering again starts from an empty library.
    let token = app.register("reader").await;
    let (_, body) = app.post("/api/book/list", Some(&token), json!({})).await;
    assert_eq!(body["total"], 0);
    let (status, _) = app
        .post("/api/book/get", Some(&token), json!({ "bookId": book["id"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::new();
    app.register("reader").await;

    let (status, _) = app
        .post(
            "/api/account/forgot-password",
            None,
            json!({ "email": "nobody@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/account/forgot-password",
            None,
            json!({ "email": "reader@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = app.mailer.last_token().unwrap();
    assert!(
        app.mailer.links.lock().unwrap()[0].starts_with("http://readlog.test/reset-password?token=")
    );

    let reset = json!({
        "token": token,
        "newPassword": "recovered password",
        "confirmPassword": "recovered password",
    });

    let (status, body) = app
        .post("/api/account/reset-password", None, reset.clone())
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    // A token works only once.
    let (status, body) = app.post("/api/account/reset-password", None, reset).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_RESET_TOKEN");

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "reader@example.com", "password": "recovered password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_reset_token_is_rejected_and_discarded() {
    let mut config = test_config();
    config.reset_token_ttl_minutes = 0;
    let (app, state) = TestApp::with_config(config, MemoryBookStore::new());
    app.register("reader").await;

    let (status, _) = app
        .post(
            "/api/account/forgot-password",
            None,
            json!({ "email": "reader@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = app.mailer.last_token().unwrap();

    let reset = json!({
        "token": token,
        "newPassword": "recovered password",
        "confirmPassword": "recovered password",
    });
    let (status, body) = app.post("/api/account/reset-password", None, reset).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_RESET_TOKEN");

    // The expired reset was removed, not left behind for another attempt.
    let stored = state
        .store
        .take_password_reset(&hash_reset_token(&token))
        .await
        .unwrap();
    assert!(stored.is_none());

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "reader@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
