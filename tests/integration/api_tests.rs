//! API integration tests against an in-process server on the in-memory store

use std::sync::Arc;

use library_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};
use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];

struct TestApp {
    base_url: String,
    client: Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        read(response).await
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self.client.put(self.url(path)).json(&body).send().await.unwrap();
        read(response).await
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        read(response).await
    }

    async fn delete(&self, path: &str) -> StatusCode {
        self.client.delete(self.url(path)).send().await.unwrap().status()
    }
}

async fn read(response: reqwest::Response) -> (StatusCode, Value) {
    let status = response.status();
    let text = response.text().await.unwrap();
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, body)
}

async fn spawn_app() -> TestApp {
    let mut config = AppConfig::default();
    config.database.url = "memory://".to_string();
    config.auth.librarian_password = Some("admin123".to_string());
    config.uploads.dir =
        std::env::temp_dir().join(format!("library-api-tests-{}", uuid::Uuid::new_v4()));

    let repository = Repository::connect(&config.database).await.unwrap();
    let services = Services::new(repository, &config).unwrap();
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api::router(state)).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{}/api", addr),
        client: Client::new(),
    }
}

/// One book with `copies` copies and two students
async fn seed(app: &TestApp, copies: i32) {
    let (status, _) = app
        .post(
            "/books",
            json!({ "id": "978-0441172719", "title": "Dune", "author": "Frank Herbert", "copies": copies }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    for (id, name, email) in [
        ("S001", "Grace", "grace@school.edu"),
        ("S002", "Alan", "alan@school.edu"),
    ] {
        let (status, _) = app
            .post(
                "/students",
                json!({ "id": id, "name": name, "email": email, "password": "letmein" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

async fn copies(app: &TestApp) -> i64 {
    let (_, book) = app.get("/books/978-0441172719").await;
    book["copies"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_login() {
    let app = spawn_app().await;
    seed(&app, 1).await;

    let (status, body) = app
        .post("/auth/login", json!({ "email": "librarian@library.com", "password": "admin123" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "librarian");
    assert_eq!(body["id"], "L001");

    let (status, body) = app
        .post("/auth/login", json!({ "email": "grace@school.edu", "password": "letmein" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "student");
    assert_eq!(body["id"], "S001");

    let (status, body) = app
        .post("/auth/login", json!({ "email": "grace@school.edu", "password": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, _) = app
        .post("/auth/login", json!({ "email": "grace@school.edu" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issue_and_return_single_copy() {
    let app = spawn_app().await;
    seed(&app, 1).await;

    let (status, loan) = app
        .post("/transactions", json!({ "bookId": "978-0441172719", "studentId": "S001" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loan["bookTitle"], "Dune");
    assert_eq!(loan["studentName"], "Grace");
    assert!(loan.as_object().unwrap().contains_key("returnDate"));
    assert!(loan["returnDate"].is_null());
    assert!(loan["finePaid"].is_null());
    assert_eq!(copies(&app).await, 0);

    let (status, body) = app
        .post("/transactions", json!({ "bookId": "978-0441172719", "studentId": "S002" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "NoCopiesAvailable");
    assert_eq!(copies(&app).await, 0);

    let id = loan["id"].as_i64().unwrap();
    let (status, returned) = app
        .put(&format!("/transactions/{}", id), json!({ "finePaid": 2.5 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["finePaid"], json!(2.5));
    assert!(returned["returnDate"].is_string());
    assert_eq!(copies(&app).await, 1);

    let (status, body) = app.put(&format!("/transactions/{}", id), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "AlreadyReturned");
    assert_eq!(copies(&app).await, 1);

    let (_, notifications) = app.get("/notifications/user/S001").await;
    let notifications = notifications.as_array().unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0]["type"], "BOOK_RETURNED");
    assert!(notifications[0]["message"].as_str().unwrap().contains("2.5"));
    assert_eq!(notifications[1]["type"], "BOOK_ISSUED");
    assert_eq!(notifications[1]["isRead"], false);

    let (_, history) = app.get("/transactions/student/S001").await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_notification_read_state() {
    let app = spawn_app().await;
    seed(&app, 2).await;

    app.post("/transactions", json!({ "bookId": "978-0441172719", "studentId": "S001" }))
        .await;
    app.post("/transactions", json!({ "bookId": "978-0441172719", "studentId": "S001" }))
        .await;

    let (_, count) = app.get("/notifications/user/S001/unread/count").await;
    assert_eq!(count, json!({ "count": 2 }));

    let (_, unread) = app.get("/notifications/user/S001/unread").await;
    let first_id = unread[0]["id"].as_i64().unwrap();
    let (status, read) = app.put(&format!("/notifications/{}/read", first_id), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["isRead"], true);

    for _ in 0..2 {
        let (status, _) = app.put("/notifications/user/S001/read-all", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let (_, count) = app.get("/notifications/user/S001/unread/count").await;
        assert_eq!(count["count"], 0);
    }

    assert_eq!(app.delete(&format!("/notifications/{}", first_id)).await, StatusCode::NO_CONTENT);
    assert_eq!(app.delete(&format!("/notifications/{}", first_id)).await, StatusCode::NOT_FOUND);
    assert_eq!(app.delete("/notifications/user/S001/clear").await, StatusCode::NO_CONTENT);
    assert_eq!(app.delete("/notifications/user/S001/clear").await, StatusCode::NO_CONTENT);

    let (_, all) = app.get("/notifications/user/S001").await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_return_fulfills_reservation() {
    let app = spawn_app().await;
    seed(&app, 1).await;

    let (_, loan) = app
        .post("/transactions", json!({ "bookId": "978-0441172719", "studentId": "S001" }))
        .await;
    let (status, hold) = app
        .post("/reservations", json!({ "bookId": "978-0441172719", "studentId": "S002" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hold["studentName"], "Alan");
    let (_, other) = app
        .post("/reservations", json!({ "bookId": "978-0441172719", "studentId": "S001" }))
        .await;

    let (_, queue) = app.get("/reservations/book/978-0441172719").await;
    assert_eq!(queue[0]["id"], hold["id"]);

    let (status, _) = app
        .put(
            &format!("/transactions/{}", loan["id"]),
            json!({ "reservationIdToFulfill": hold["id"].to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, remaining) = app.get("/reservations").await;
    let remaining = remaining.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["id"], other["id"]);

    let (_, alan) = app.get("/notifications/user/S002").await;
    assert!(alan.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_not_found_and_conflicts() {
    let app = spawn_app().await;
    seed(&app, 1).await;

    let (status, body) = app.get("/books/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchBook");

    let (status, _) = app
        .post("/transactions", json!({ "bookId": "978-0441172719", "studentId": "S404" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.put("/transactions/999", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/books", json!({ "id": "978-0441172719", "title": "Dune again" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.post("/transactions", json!({ "bookId": "978-0441172719", "studentId": "S001" }))
        .await;
    assert_eq!(app.delete("/books/978-0441172719").await, StatusCode::CONFLICT);
    assert_eq!(app.delete("/reservations/12").await, StatusCode::NOT_FOUND);

    let (status, _) = app.post("/transactions", json!({ "bookId": "978-0441172719" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_book_image_upload() {
    let app = spawn_app().await;

    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(PNG_BYTES.to_vec())
            .file_name("cover.png")
            .mime_str("image/png")
            .unwrap(),
    );
    let response = app
        .client
        .post(app.url("/upload/book-image"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let (status, stored) = read(response).await;
    assert_eq!(status, StatusCode::OK);
    let filename = stored["filename"].as_str().unwrap().to_string();
    assert_eq!(stored["url"], format!("/api/uploads/books/{}", filename));

    let response = app
        .client
        .get(app.url(&format!("/uploads/books/{}", filename)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.bytes().await.unwrap().as_ref(), PNG_BYTES);

    assert_eq!(
        app.delete(&format!("/uploads/books/{}", filename)).await,
        StatusCode::NO_CONTENT
    );
    let (status, _) = app.get(&format!("/uploads/books/{}", filename)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(b"plain".to_vec())
            .file_name("notes.txt")
            .mime_str("text/plain")
            .unwrap(),
    );
    let response = app
        .client
        .post(app.url("/upload/book-image"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats() {
    let app = spawn_app().await;
    seed(&app, 3).await;
    app.post("/transactions", json!({ "bookId": "978-0441172719", "studentId": "S001" }))
        .await;

    let (status, stats) = app.get("/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalBooks"], 1);
    assert_eq!(stats["availableCopies"], 2);
    assert_eq!(stats["totalStudents"], 2);
    assert_eq!(stats["activeLoans"], 1);
    assert_eq!(stats["overdueLoans"], 0);
}
