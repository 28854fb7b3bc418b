//! Circulation transaction (borrow / return) model

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{book::Book, member::Member};
use crate::error::AppError;

/// Fixed borrowing period
pub const LOAN_PERIOD_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Borrowed,
    Returned,
    /// Borrowed past its due date; set lazily when transactions are listed
    Overdue,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Borrowed => "borrowed",
            TransactionStatus::Returned => "returned",
            TransactionStatus::Overdue => "overdue",
        }
    }

    /// The copy is still out with the member
    pub fn is_active(&self) -> bool {
        !matches!(self, TransactionStatus::Returned)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(TransactionStatus::Borrowed),
            "returned" => Ok(TransactionStatus::Returned),
            "overdue" => Ok(TransactionStatus::Overdue),
            other => Err(AppError::Internal(format!(
                "Unknown transaction status '{}'",
                other
            ))),
        }
    }
}

/// Transaction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: String,
    pub book_id: String,
    pub member_id: String,
    pub checkout_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// Raw database row, status stored as text
#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub id: String,
    pub book_id: String,
    pub member_id: String,
    pub checkout_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row.status.parse()?,
            id: row.id,
            book_id: row.book_id,
            member_id: row.member_id,
            checkout_date: row.checkout_date,
            due_date: row.due_date,
            return_date: row.return_date,
            created_at: row.created_at,
        })
    }
}

impl Transaction {
    /// New borrowed transaction due `LOAN_PERIOD_DAYS` after `now`
    pub fn checkout(book_id: &str, member_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            member_id: member_id.to_string(),
            checkout_date: now,
            due_date: now + Duration::days(LOAN_PERIOD_DAYS),
            return_date: None,
            status: TransactionStatus::Borrowed,
            created_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.due_date < now
    }

    /// Move a borrowed transaction past its due date to overdue.
    ///
    /// Returns `true` only when the status actually changed, so callers know
    /// whether the transition still has to be persisted.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == TransactionStatus::Borrowed && self.due_date < now {
            self.status = TransactionStatus::Overdue;
            return true;
        }
        false
    }

    /// Whole days past the due date, 0 when returned or not yet late
    pub fn days_overdue(&self, now: DateTime<Utc>) -> i64 {
        if self.is_past_due(now) {
            (now - self.due_date).num_days()
        } else {
            0
        }
    }

    pub fn mark_returned(&mut self, now: DateTime<Utc>) {
        self.status = TransactionStatus::Returned;
        self.return_date = Some(now);
    }
}

/// Checkout request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub book_id: String,
    pub member_id: String,
}

/// Transaction joined with its book and member for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionDetails {
    pub id: String,
    pub book_id: String,
    pub member_id: String,
    /// `None` when the book has since been removed
    pub book: Option<Book>,
    pub member: Option<Member>,
    pub checkout_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
    pub days_overdue: i64,
}

impl TransactionDetails {
    pub fn new(
        transaction: Transaction,
        book: Option<Book>,
        member: Option<Member>,
        now: DateTime<Utc>,
    ) -> Self {
        let days_overdue = transaction.days_overdue(now);
        Self {
            id: transaction.id,
            book_id: transaction.book_id,
            member_id: transaction.member_id,
            book,
            member,
            checkout_date: transaction.checkout_date,
            due_date: transaction.due_date,
            return_date: transaction.return_date,
            status: transaction.status,
            days_overdue,
        }
    }
}
