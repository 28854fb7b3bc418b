//! Router integration tests over the in-memory store

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use school_library_server::{
    api::create_router,
    config::StorageBackend,
    models::Transaction,
    repository::{memory::MemoryLibraryStore, CheckoutOutcome, LibraryStore, Repository},
    AppConfig, AppState,
};

fn app_with_store() -> (Router, Arc<MemoryLibraryStore>) {
    let store = Arc::new(MemoryLibraryStore::new());
    let mut config = AppConfig::default();
    config.storage.backend = StorageBackend::Memory;
    let state = AppState::new(config, Repository::new(store.clone()));
    (create_router(state), store)
}

fn app() -> Router {
    app_with_store().0
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_book(app: &Router, title: &str, author: &str, copies: i32) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/books",
        Some(json!({
            "title": title,
            "author": author,
            "isbn": format!("isbn-{}", title.to_lowercase().replace(' ', "-")),
            "genre": "Fiction",
            "total_copies": copies
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

async fn create_member(app: &Router, name: &str, student_id: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/members",
        Some(json!({
            "name": name,
            "student_id": student_id,
            "grade": "7",
            "email": format!("{}@school.example", student_id.to_lowercase())
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

async fn checkout(app: &Router, book_id: &Value, member_id: &Value) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/transactions/checkout",
        Some(json!({ "book_id": book_id, "member_id": member_id })),
    )
    .await
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body.get("storage"), None);

    let (status, body) = send(&app, Method::GET, "/api/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_book_crud() {
    let app = app();
    let book = create_book(&app, "Dune", "Frank Herbert", 3).await;
    assert_eq!(book["total_copies"], 3);
    assert_eq!(book["available_copies"], 3);

    let uri = format!("/api/books/{}", book["id"].as_str().unwrap());
    let (status, fetched) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, book);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({
            "title": "Dune Messiah",
            "author": "Frank Herbert",
            "isbn": "978-0593098233",
            "genre": "Science Fiction",
            "total_copies": 5,
            "description": "Second book"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Dune Messiah");
    assert_eq!(updated["total_copies"], 5);
    assert_eq!(updated["available_copies"], 5);
    assert_eq!(updated["created_at"], book["created_at"]);

    let (status, list) = send(&app, Method::GET, "/api/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book deleted successfully");

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Book not found");
}

#[tokio::test]
async fn test_negative_copies_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(json!({
            "title": "Broken",
            "author": "Nobody",
            "isbn": "0",
            "genre": "None",
            "total_copies": -1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("total_copies"));
}

#[tokio::test]
async fn test_unknown_ids_return_not_found() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/members/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Member not found");

    let (status, _) = send(&app, Method::DELETE, "/api/books/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::POST, "/api/transactions/missing/return", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Transaction not found");
}

#[tokio::test]
async fn test_duplicate_student_id_rejected() {
    let app = app();
    let first = create_member(&app, "Ada", "S-100").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/members",
        Some(json!({ "name": "Grace", "student_id": "S-100", "grade": "8" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Student ID already exists");

    // Updating a member to keep its own student_id is allowed
    let uri = format!("/api/members/{}", first["id"].as_str().unwrap());
    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "name": "Ada Lovelace", "student_id": "S-100", "grade": "8" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Ada Lovelace");
    assert_eq!(updated["email"], Value::Null);
}

#[tokio::test]
async fn test_checkout_and_return_cycle() {
    let app = app();
    let book = create_book(&app, "Nineteen Eighty-Four", "George Orwell", 5).await;
    let member = create_member(&app, "Ada", "S-1").await;
    let book_uri = format!("/api/books/{}", book["id"].as_str().unwrap());

    let (status, tx) = checkout(&app, &book["id"], &member["id"]).await;
    assert_eq!(status, StatusCode::OK, "{tx}");
    assert_eq!(tx["status"], "borrowed");
    assert_eq!(tx["return_date"], Value::Null);

    let (_, fetched) = send(&app, Method::GET, &book_uri, None).await;
    assert_eq!(fetched["available_copies"], 4);

    let (status, body) = checkout(&app, &book["id"], &member["id"]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Member already has this book borrowed");

    let return_uri = format!("/api/transactions/{}/return", tx["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::POST, &return_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book returned successfully");
    assert_eq!(body["transaction"]["status"], "returned");
    assert!(body["transaction"]["return_date"].is_string());

    let (_, fetched) = send(&app, Method::GET, &book_uri, None).await;
    assert_eq!(fetched["available_copies"], 5);

    let (status, body) = send(&app, Method::POST, &return_uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Book is not currently borrowed");

    let (_, fetched) = send(&app, Method::GET, &book_uri, None).await;
    assert_eq!(fetched["available_copies"], 5);
}

#[tokio::test]
async fn test_checkout_failures() {
    let app = app();
    let book = create_book(&app, "Single Copy", "Author", 1).await;
    let ada = create_member(&app, "Ada", "S-1").await;
    let grace = create_member(&app, "Grace", "S-2").await;

    let (status, body) = checkout(&app, &json!("missing"), &ada["id"]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Book not found");

    let (status, body) = checkout(&app, &book["id"], &json!("missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Member not found");

    let (status, _) = checkout(&app, &book["id"], &ada["id"]).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = checkout(&app, &book["id"], &grace["id"]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Book not available");
}

#[tokio::test]
async fn test_delete_blocked_while_borrowed() {
    let app = app();
    let book = create_book(&app, "Borrowed", "Author", 2).await;
    let member = create_member(&app, "Ada", "S-1").await;
    let (_, tx) = checkout(&app, &book["id"], &member["id"]).await;

    let book_uri = format!("/api/books/{}", book["id"].as_str().unwrap());
    let member_uri = format!("/api/members/{}", member["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &book_uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Cannot delete book that is currently borrowed");

    let (status, body) = send(&app, Method::DELETE, &member_uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Cannot delete member who has borrowed books");

    let return_uri = format!("/api/transactions/{}/return", tx["id"].as_str().unwrap());
    send(&app, Method::POST, &return_uri, None).await;

    let (status, body) = send(&app, Method::DELETE, &member_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Member deleted successfully");

    let (status, _) = send(&app, Method::DELETE, &book_uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_transaction_listing_embeds_details() {
    let app = app();
    let book = create_book(&app, "Embedded", "Author", 1).await;
    let member = create_member(&app, "Ada", "S-1").await;
    checkout(&app, &book["id"], &member["id"]).await;

    let (status, list) = send(&app, Method::GET, "/api/transactions", None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = list.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["book"]["title"], "Embedded");
    assert_eq!(entries[0]["member"]["student_id"], "S-1");
    assert_eq!(entries[0]["days_overdue"], 0);
    assert_eq!(entries[0]["status"], "borrowed");
}

#[tokio::test]
async fn test_overdue_transactions_marked_on_listing() {
    let (app, store) = app_with_store();
    let book = create_book(&app, "Late", "Author", 2).await;
    let member = create_member(&app, "Ada", "S-1").await;

    let backdated = Transaction::checkout(
        book["id"].as_str().unwrap(),
        member["id"].as_str().unwrap(),
        Utc::now() - Duration::days(20),
    );
    assert_eq!(store.checkout(&backdated).await.unwrap(), CheckoutOutcome::Created);

    for _ in 0..2 {
        let (status, list) = send(&app, Method::GET, "/api/transactions", None).await;
        assert_eq!(status, StatusCode::OK);
        let entry = &list.as_array().unwrap()[0];
        assert_eq!(entry["status"], "overdue");
        assert_eq!(entry["days_overdue"], 6);
    }

    let (_, stats) = send(&app, Method::GET, "/api/dashboard/stats", None).await;
    assert_eq!(stats["overdue_books"], 1);
    assert_eq!(stats["borrowed_books"], 1);

    // Overdue loans can still be returned
    let return_uri = format!("/api/transactions/{}/return", backdated.id);
    let (status, body) = send(&app, Method::POST, &return_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction"]["status"], "returned");

    let (_, stats) = send(&app, Method::GET, "/api/dashboard/stats", None).await;
    assert_eq!(stats["overdue_books"], 0);
    assert_eq!(stats["available_copies"], 2);
}

#[tokio::test]
async fn test_dashboard_counts() {
    let app = app();
    let (_, empty) = send(&app, Method::GET, "/api/dashboard/stats", None).await;
    assert_eq!(
        empty,
        json!({
            "total_books": 0,
            "total_members": 0,
            "total_copies": 0,
            "borrowed_books": 0,
            "available_copies": 0,
            "overdue_books": 0
        })
    );

    let first = create_book(&app, "First", "Author", 3).await;
    create_book(&app, "Second", "Author", 2).await;
    let member = create_member(&app, "Ada", "S-1").await;
    checkout(&app, &first["id"], &member["id"]).await;

    let (status, stats) = send(&app, Method::GET, "/api/dashboard/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_books"], 2);
    assert_eq!(stats["total_members"], 1);
    assert_eq!(stats["total_copies"], 5);
    assert_eq!(stats["available_copies"], 4);
    assert_eq!(stats["borrowed_books"], 1);
    assert_eq!(stats["overdue_books"], 0);
}

#[tokio::test]
async fn test_search_endpoints() {
    let app = app();
    create_book(&app, "Animal Farm", "George Orwell", 2).await;
    create_book(&app, "Brave New World", "Aldous Huxley", 1).await;
    create_member(&app, "Ada Lovelace", "S-1").await;
    create_member(&app, "Grace Hopper", "S-2").await;

    let (status, books) = send(&app, Method::GET, "/api/search/books?q=orwell", None).await;
    assert_eq!(status, StatusCode::OK);
    let books = books.as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Animal Farm");

    let (_, books) = send(&app, Method::GET, "/api/search/books", None).await;
    assert_eq!(books.as_array().unwrap().len(), 2);

    let (_, members) = send(&app, Method::GET, "/api/search/members?q=HOPPER", None).await;
    let members = members.as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["student_id"], "S-2");

    let (_, members) = send(&app, Method::GET, "/api/search/members?grade=12", None).await;
    assert!(members.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_available_only_flag() {
    let app = app();
    let book = create_book(&app, "Last Copy", "Author", 1).await;
    create_book(&app, "On Shelf", "Author", 2).await;
    let member = create_member(&app, "Ada", "S-1").await;
    checkout(&app, &book["id"], &member["id"]).await;

    for flag in ["true", "1", "yes", "on"] {
        let uri = format!("/api/search/books?available_only={flag}");
        let (status, books) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK, "{flag}");
        let books = books.as_array().unwrap();
        assert_eq!(books.len(), 1, "{flag}");
        assert_eq!(books[0]["title"], "On Shelf");
    }

    let (_, books) = send(&app, Method::GET, "/api/search/books?available_only=0", None).await;
    assert_eq!(books.as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::GET, "/api/search/books?available_only=maybe", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
