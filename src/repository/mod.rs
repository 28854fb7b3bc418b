//! Repository layer: the `LibraryStore` seam and its backends
//!
//! Every mutating operation that has to check something before writing
//! (availability, duplicate borrows, student ID uniqueness, active borrows on
//! delete) is a single store call, so each backend can run the check and the
//! write as one atomic unit.

pub mod memory;
pub mod postgres;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, BookInput, BookQuery, BookTotals, Member, MemberInput, MemberQuery, Transaction},
};

/// Row cap applied to every list and search read
pub const LIST_LIMIT: i64 = 1000;

/// Result of an atomic checkout attempt, checks evaluated in this order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Created,
    BookNotFound,
    Unavailable,
    MemberNotFound,
    AlreadyBorrowed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReturnOutcome {
    Returned(Transaction),
    NotFound,
    NotBorrowed,
}

/// Result of deleting a book or member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    ActiveBorrow,
}

/// Result of creating or updating a member
#[derive(Debug, Clone, PartialEq)]
pub enum MemberWrite {
    Written(Member),
    NotFound,
    DuplicateStudentId,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Round trip to the backing store
    async fn ping(&self) -> AppResult<()>;

    // Books
    async fn insert_book(&self, book: &Book) -> AppResult<()>;
    async fn list_books(&self, limit: i64) -> AppResult<Vec<Book>>;
    async fn get_book(&self, id: &str) -> AppResult<Option<Book>>;
    /// Apply `Book::apply_update` atomically; `None` when the book is missing
    async fn update_book(&self, id: &str, input: &BookInput) -> AppResult<Option<Book>>;
    async fn delete_book(&self, id: &str) -> AppResult<DeleteOutcome>;
    async fn search_books(&self, query: &BookQuery, limit: i64) -> AppResult<Vec<Book>>;
    async fn book_totals(&self) -> AppResult<BookTotals>;

    // Members
    async fn insert_member(&self, member: &Member) -> AppResult<MemberWrite>;
    async fn list_members(&self, limit: i64) -> AppResult<Vec<Member>>;
    async fn get_member(&self, id: &str) -> AppResult<Option<Member>>;
    async fn update_member(&self, id: &str, input: &MemberInput) -> AppResult<MemberWrite>;
    async fn delete_member(&self, id: &str) -> AppResult<DeleteOutcome>;
    async fn search_members(&self, query: &MemberQuery, limit: i64) -> AppResult<Vec<Member>>;
    async fn count_members(&self) -> AppResult<i64>;

    // Transactions
    /// Insert `transaction` and take one copy of its book, if every checkout
    /// rule holds.
    async fn checkout(&self, transaction: &Transaction) -> AppResult<CheckoutOutcome>;
    /// Close an active transaction and give the copy back
    async fn return_transaction(
        &self,
        id: &str,
        returned_at: DateTime<Utc>,
    ) -> AppResult<ReturnOutcome>;
    /// Newest first
    async fn list_transactions(&self, limit: i64) -> AppResult<Vec<Transaction>>;
    /// Persist the overdue transition; no-op unless the row is still `borrowed`
    async fn mark_overdue(&self, id: &str) -> AppResult<()>;
    /// Active transactions whose due date is before `now`
    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64>;
}

/// Shared handle to the configured store
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn LibraryStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    /// Repository backed by the PostgreSQL pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self::new(Arc::new(postgres::PgLibraryStore::new(pool)))
    }

    /// Repository backed by an empty in-process store
    pub fn memory() -> Self {
        Self::new(Arc::new(memory::MemoryLibraryStore::new()))
    }
}

impl Deref for Repository {
    type Target = dyn LibraryStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}
