//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, dashboard, health, members, search, transactions};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Library API",
        version = "0.1.0",
        description = "Books, members and circulation for a school library"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Members
        members::list_members,
        members::get_member,
        members::create_member,
        members::update_member,
        members::delete_member,
        // Transactions
        transactions::checkout_book,
        transactions::return_book,
        transactions::list_transactions,
        // Search
        search::search_books,
        search::search_members,
        // Dashboard
        dashboard::get_stats,
    ),
    components(
        schemas(
            // Books
            crate::models::Book,
            crate::models::BookInput,
            // Members
            crate::models::Member,
            crate::models::MemberInput,
            // Transactions
            crate::models::Transaction,
            crate::models::TransactionStatus,
            crate::models::TransactionDetails,
            crate::models::CheckoutRequest,
            transactions::ReturnResponse,
            // Dashboard
            crate::models::DashboardStats,
            // Health
            health::HealthResponse,
            // Common
            crate::models::MessageResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "members", description = "Library members"),
        (name = "transactions", description = "Checkouts and returns"),
        (name = "search", description = "Book and member search"),
        (name = "dashboard", description = "Library statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
