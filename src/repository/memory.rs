//! In-process `LibraryStore`
//!
//! Holds the three collections behind one `RwLock`. Each mutating call keeps
//! the write guard for its whole check-and-write, which gives the same
//! atomicity as the row locks taken by the PostgreSQL backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{CheckoutOutcome, DeleteOutcome, LibraryStore, MemberWrite, ReturnOutcome};
use crate::{
    error::AppResult,
    models::{
        Book, BookInput, BookQuery, BookTotals, Member, MemberInput, MemberQuery, Transaction,
        TransactionStatus,
    },
};

#[derive(Default)]
struct Tables {
    books: IndexMap<String, Book>,
    members: IndexMap<String, Member>,
    transactions: IndexMap<String, Transaction>,
}

impl Tables {
    fn has_active_for_book(&self, book_id: &str) -> bool {
        self.transactions
            .values()
            .any(|t| t.book_id == book_id && t.is_active())
    }

    fn has_active_for_member(&self, member_id: &str) -> bool {
        self.transactions
            .values()
            .any(|t| t.member_id == member_id && t.is_active())
    }

    fn student_id_taken(&self, student_id: &str, except: Option<&str>) -> bool {
        self.members
            .values()
            .any(|m| m.student_id == student_id && Some(m.id.as_str()) != except)
    }
}

#[derive(Default)]
pub struct MemoryLibraryStore {
    tables: RwLock<Tables>,
}

impl MemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn capped<T>(items: impl Iterator<Item = T>, limit: i64) -> Vec<T> {
    items.take(usize::try_from(limit).unwrap_or(0)).collect()
}

#[async_trait]
impl LibraryStore for MemoryLibraryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn insert_book(&self, book: &Book) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.books.insert(book.id.clone(), book.clone());
        Ok(())
    }

    async fn list_books(&self, limit: i64) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(capped(tables.books.values().cloned(), limit))
    }

    async fn get_book(&self, id: &str) -> AppResult<Option<Book>> {
        let tables = self.tables.read().await;
        Ok(tables.books.get(id).cloned())
    }

    async fn update_book(&self, id: &str, input: &BookInput) -> AppResult<Option<Book>> {
        let mut tables = self.tables.write().await;
        Ok(tables.books.get_mut(id).map(|book| {
            book.apply_update(input);
            book.clone()
        }))
    }

    async fn delete_book(&self, id: &str) -> AppResult<DeleteOutcome> {
        let mut tables = self.tables.write().await;
        if tables.has_active_for_book(id) {
            return Ok(DeleteOutcome::ActiveBorrow);
        }
        Ok(match tables.books.shift_remove(id) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn search_books(&self, query: &BookQuery, limit: i64) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(capped(
            tables.books.values().filter(|b| query.matches(b)).cloned(),
            limit,
        ))
    }

    async fn book_totals(&self) -> AppResult<BookTotals> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .values()
            .fold(BookTotals::default(), |mut totals, book| {
                totals.books += 1;
                totals.total_copies += i64::from(book.total_copies);
                totals.available_copies += i64::from(book.available_copies);
                totals
            }))
    }

    async fn insert_member(&self, member: &Member) -> AppResult<MemberWrite> {
        let mut tables = self.tables.write().await;
        if tables.student_id_taken(&member.student_id, None) {
            return Ok(MemberWrite::DuplicateStudentId);
        }
        tables.members.insert(member.id.clone(), member.clone());
        Ok(MemberWrite::Written(member.clone()))
    }

    async fn list_members(&self, limit: i64) -> AppResult<Vec<Member>> {
        let tables = self.tables.read().await;
        Ok(capped(tables.members.values().cloned(), limit))
    }

    async fn get_member(&self, id: &str) -> AppResult<Option<Member>> {
        let tables = self.tables.read().await;
        Ok(tables.members.get(id).cloned())
    }

    async fn update_member(&self, id: &str, input: &MemberInput) -> AppResult<MemberWrite> {
        let mut tables = self.tables.write().await;
        let current = match tables.members.get(id) {
            Some(member) => member.student_id.clone(),
            None => return Ok(MemberWrite::NotFound),
        };
        if input.student_id != current && tables.student_id_taken(&input.student_id, Some(id)) {
            return Ok(MemberWrite::DuplicateStudentId);
        }
        Ok(match tables.members.get_mut(id) {
            Some(member) => {
                member.apply_update(input);
                MemberWrite::Written(member.clone())
            }
            None => MemberWrite::NotFound,
        })
    }

    async fn delete_member(&self, id: &str) -> AppResult<DeleteOutcome> {
        let mut tables = self.tables.write().await;
        if tables.has_active_for_member(id) {
            return Ok(DeleteOutcome::ActiveBorrow);
        }
        Ok(match tables.members.shift_remove(id) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn search_members(&self, query: &MemberQuery, limit: i64) -> AppResult<Vec<Member>> {
        let tables = self.tables.read().await;
        Ok(capped(
            tables.members.values().filter(|m| query.matches(m)).cloned(),
            limit,
        ))
    }

    async fn count_members(&self) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.members.len() as i64)
    }

    async fn checkout(&self, transaction: &Transaction) -> AppResult<CheckoutOutcome> {
        let mut tables = self.tables.write().await;

        match tables.books.get(&transaction.book_id) {
            None => return Ok(CheckoutOutcome::BookNotFound),
            Some(book) if !book.is_available() => return Ok(CheckoutOutcome::Unavailable),
            Some(_) => {}
        }
        if !tables.members.contains_key(&transaction.member_id) {
            return Ok(CheckoutOutcome::MemberNotFound);
        }
        let already_borrowed = tables.transactions.values().any(|t| {
            t.book_id == transaction.book_id
                && t.member_id == transaction.member_id
                && t.is_active()
        });
        if already_borrowed {
            return Ok(CheckoutOutcome::AlreadyBorrowed);
        }

        tables
            .transactions
            .insert(transaction.id.clone(), transaction.clone());
        if let Some(book) = tables.books.get_mut(&transaction.book_id) {
            book.available_copies -= 1;
        }
        Ok(CheckoutOutcome::Created)
    }

    async fn return_transaction(
        &self,
        id: &str,
        returned_at: DateTime<Utc>,
    ) -> AppResult<ReturnOutcome> {
        let mut tables = self.tables.write().await;

        let returned = match tables.transactions.get_mut(id) {
            None => return Ok(ReturnOutcome::NotFound),
            Some(t) if !t.is_active() => return Ok(ReturnOutcome::NotBorrowed),
            Some(t) => {
                t.mark_returned(returned_at);
                t.clone()
            }
        };
        if let Some(book) = tables.books.get_mut(&returned.book_id) {
            book.available_copies = (book.available_copies + 1).min(book.total_copies);
        }
        Ok(ReturnOutcome::Returned(returned))
    }

    async fn list_transactions(&self, limit: i64) -> AppResult<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let mut all: Vec<Transaction> = tables.transactions.values().rev().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(all)
    }

    async fn mark_overdue(&self, id: &str) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(t) = tables.transactions.get_mut(id) {
            if t.status == TransactionStatus::Borrowed {
                t.status = TransactionStatus::Overdue;
            }
        }
        Ok(())
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .transactions
            .values()
            .filter(|t| t.is_past_due(now))
            .count() as i64)
    }
}
