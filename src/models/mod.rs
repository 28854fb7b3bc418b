//! Data models for the library server

pub mod book;
pub mod dashboard;
pub mod member;
pub mod transaction;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Re-export commonly used types
pub use book::{Book, BookInput, BookQuery, BookTotals};
pub use dashboard::DashboardStats;
pub use member::{Member, MemberInput, MemberQuery};
pub use transaction::{
    CheckoutRequest, Transaction, TransactionDetails, TransactionStatus, LOAN_PERIOD_DAYS,
};

/// Plain confirmation body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Case-insensitive substring test used by the in-memory search paths
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
