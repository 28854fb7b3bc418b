//! API handlers for the school library REST endpoints

pub mod books;
pub mod dashboard;
pub mod health;
pub mod members;
pub mod openapi;
pub mod search;
pub mod transactions;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Members
        .route("/members", get(members::list_members).post(members::create_member))
        .route(
            "/members/:id",
            get(members::get_member)
                .put(members::update_member)
                .delete(members::delete_member),
        )
        // Transactions
        .route("/transactions", get(transactions::list_transactions))
        .route("/transactions/checkout", post(transactions::checkout_book))
        .route("/transactions/:id/return", post(transactions::return_book))
        // Dashboard
        .route("/dashboard/stats", get(dashboard::get_stats))
        // Search
        .route("/search/books", get(search::search_books))
        .route("/search/members", get(search::search_members))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api", api)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
