//! Dashboard summary model

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::book::BookTotals;

/// Catalog-wide counters shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_books: i64,
    pub total_members: i64,
    pub total_copies: i64,
    /// Always `total_copies - available_copies`
    pub borrowed_books: i64,
    pub available_copies: i64,
    pub overdue_books: i64,
}

impl DashboardStats {
    pub fn new(books: BookTotals, total_members: i64, overdue_books: i64) -> Self {
        Self {
            total_books: books.books,
            total_members,
            total_copies: books.total_copies,
            borrowed_books: books.total_copies - books.available_copies,
            available_copies: books.available_copies,
            overdue_books,
        }
    }
}
