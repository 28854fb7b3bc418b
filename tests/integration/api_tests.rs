//! API integration tests against a running server

use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8001/api";

/// Create a book and a member with unique identifiers, returning their ids
async fn seed(client: &Client, copies: i32) -> (String, String) {
    let tag = Uuid::new_v4().simple().to_string();

    let book: Value = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": format!("Live Test {}", tag),
            "author": "Test Author",
            "isbn": tag,
            "genre": "Testing",
            "total_copies": copies
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let member: Value = client
        .post(format!("{}/members", BASE_URL))
        .json(&json!({
            "name": "Live Tester",
            "student_id": tag,
            "grade": "9"
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    (
        book["id"].as_str().expect("No book id").to_string(),
        member["id"].as_str().expect("No member id").to_string(),
    )
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_checkout_and_return() {
    let client = Client::new();
    let (book_id, member_id) = seed(&client, 2).await;

    let response = client
        .post(format!("{}/transactions/checkout", BASE_URL))
        .json(&json!({ "book_id": book_id, "member_id": member_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let tx: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(tx["status"], "borrowed");

    let response = client
        .post(format!("{}/transactions/{}/return", BASE_URL, tx["id"].as_str().unwrap()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(book["available_copies"], 2);
}

#[tokio::test]
#[ignore]
async fn test_get_missing_book() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/{}", BASE_URL, Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["detail"], "Book not found");
}

#[tokio::test]
#[ignore]
async fn test_dashboard_stats() {
    let client = Client::new();

    let response = client
        .get(format!("{}/dashboard/stats", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let total = body["total_copies"].as_i64().unwrap();
    let available = body["available_copies"].as_i64().unwrap();
    assert!(available <= total);
}
