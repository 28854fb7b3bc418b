//! Circulation service: checkout, return and the transaction log

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{Book, CheckoutRequest, Member, Transaction, TransactionDetails},
    repository::{CheckoutOutcome, Repository, ReturnOutcome, LIST_LIMIT},
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
}

impl CirculationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Lend one copy of a book to a member for `LOAN_PERIOD_DAYS`
    pub async fn checkout(&self, request: CheckoutRequest) -> AppResult<Transaction> {
        let transaction = Transaction::checkout(&request.book_id, &request.member_id, Utc::now());

        match self.repository.checkout(&transaction).await? {
            CheckoutOutcome::Created => {
                tracing::info!(
                    "Circulation: book {} checked out to member {} (transaction {}, due {})",
                    transaction.book_id,
                    transaction.member_id,
                    transaction.id,
                    transaction.due_date
                );
                Ok(transaction)
            }
            CheckoutOutcome::BookNotFound => Err(AppError::NotFound("Book not found".to_string())),
            CheckoutOutcome::Unavailable => {
                tracing::warn!("Circulation: book {} has no copy left", request.book_id);
                Err(AppError::Conflict("Book not available".to_string()))
            }
            CheckoutOutcome::MemberNotFound => {
                Err(AppError::NotFound("Member not found".to_string()))
            }
            CheckoutOutcome::AlreadyBorrowed => Err(AppError::Conflict(
                "Member already has this book borrowed".to_string(),
            )),
        }
    }

    /// Close an active transaction and put the copy back on the shelf
    pub async fn return_book(&self, transaction_id: &str) -> AppResult<Transaction> {
        match self
            .repository
            .return_transaction(transaction_id, Utc::now())
            .await?
        {
            ReturnOutcome::Returned(transaction) => {
                tracing::info!(
                    "Circulation: transaction {} returned (book {})",
                    transaction.id,
                    transaction.book_id
                );
                Ok(transaction)
            }
            ReturnOutcome::NotFound => {
                Err(AppError::NotFound("Transaction not found".to_string()))
            }
            ReturnOutcome::NotBorrowed => Err(AppError::Conflict(
                "Book is not currently borrowed".to_string(),
            )),
        }
    }

    /// Transaction log, newest first, joined with books and members.
    ///
    /// Borrowed transactions found past their due date are moved to overdue
    /// and the transition is persisted.
    pub async fn list_transactions(&self) -> AppResult<Vec<TransactionDetails>> {
        self.list_transactions_at(Utc::now()).await
    }

    async fn list_transactions_at(&self, now: DateTime<Utc>) -> AppResult<Vec<TransactionDetails>> {
        let transactions = self.repository.list_transactions(LIST_LIMIT).await?;

        let mut books: HashMap<String, Option<Book>> = HashMap::new();
        let mut members: HashMap<String, Option<Member>> = HashMap::new();
        let mut details = Vec::with_capacity(transactions.len());

        for mut transaction in transactions {
            if transaction.refresh_status(now) {
                self.repository.mark_overdue(&transaction.id).await?;
                tracing::debug!("Circulation: transaction {} is now overdue", transaction.id);
            }

            if !books.contains_key(&transaction.book_id) {
                let book = self.repository.get_book(&transaction.book_id).await?;
                books.insert(transaction.book_id.clone(), book);
            }
            if !members.contains_key(&transaction.member_id) {
                let member = self.repository.get_member(&transaction.member_id).await?;
                members.insert(transaction.member_id.clone(), member);
            }

            let book = books.get(&transaction.book_id).cloned().flatten();
            let member = members.get(&transaction.member_id).cloned().flatten();
            details.push(TransactionDetails::new(transaction, book, member, now));
        }

        Ok(details)
    }
}
