//! PostgreSQL `LibraryStore`
//!
//! Conditional writes run inside one database transaction with the affected
//! rows locked (`FOR UPDATE`). The schema backs them up with a unique index on
//! `members.student_id` and a partial unique index on active
//! `(book_id, member_id)` pairs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use super::{CheckoutOutcome, DeleteOutcome, LibraryStore, MemberWrite, ReturnOutcome};
use crate::{
    error::AppResult,
    models::{
        transaction::TransactionRow, Book, BookInput, BookQuery, BookTotals, Member, MemberInput,
        MemberQuery, Transaction, TransactionStatus,
    },
};

const ACTIVE_STATUSES: &str = "('borrowed', 'overdue')";

#[derive(Clone)]
pub struct PgLibraryStore {
    pool: Pool<Postgres>,
}

impl PgLibraryStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// `ILIKE` pattern matching `term` as a literal substring
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl LibraryStore for PgLibraryStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_book(&self, book: &Book) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, isbn, genre, total_copies, available_copies, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.genre)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(&book.description)
        .bind(book.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_books(&self, limit: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created_at LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get_book(&self, id: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn update_book(&self, id: &str, input: &BookInput) -> AppResult<Option<Book>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut book) =
            sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };

        book.apply_update(input);

        sqlx::query(
            r#"
            UPDATE books
            SET title = $1, author = $2, isbn = $3, genre = $4,
                total_copies = $5, available_copies = $6, description = $7
            WHERE id = $8
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.genre)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(&book.description)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(book))
    }

    async fn delete_book(&self, id: &str) -> AppResult<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serializes with concurrent checkouts of the same book
        sqlx::query("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let borrowed: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM transactions WHERE book_id = $1 AND status IN {})",
            ACTIVE_STATUSES
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if borrowed {
            return Ok(DeleteOutcome::ActiveBorrow);
        }

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(if result.rows_affected() == 0 {
            DeleteOutcome::NotFound
        } else {
            DeleteOutcome::Deleted
        })
    }

    async fn search_books(&self, query: &BookQuery, limit: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR title ILIKE $1 OR author ILIKE $1 OR isbn ILIKE $1)
              AND ($2::text IS NULL OR genre ILIKE $2)
              AND (NOT $3 OR available_copies > 0)
            ORDER BY created_at
            LIMIT $4
            "#,
        )
        .bind(query.text().map(like_pattern))
        .bind(query.genre().map(like_pattern))
        .bind(query.available_only())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn book_totals(&self) -> AppResult<BookTotals> {
        let totals = sqlx::query_as::<_, BookTotals>(
            r#"
            SELECT COUNT(*)::bigint AS books,
                   COALESCE(SUM(total_copies), 0)::bigint AS total_copies,
                   COALESCE(SUM(available_copies), 0)::bigint AS available_copies
            FROM books
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    async fn insert_member(&self, member: &Member) -> AppResult<MemberWrite> {
        let result = sqlx::query(
            r#"
            INSERT INTO members (id, name, student_id, grade, picture_base64, email, phone, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&member.student_id)
        .bind(&member.grade)
        .bind(&member.picture_base64)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(member.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(MemberWrite::Written(member.clone())),
            Err(e) if is_unique_violation(&e) => Ok(MemberWrite::DuplicateStudentId),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_members(&self, limit: i64) -> AppResult<Vec<Member>> {
        let members =
            sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY created_at LIMIT $1")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
        Ok(members)
    }

    async fn get_member(&self, id: &str) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn update_member(&self, id: &str, input: &MemberInput) -> AppResult<MemberWrite> {
        let mut tx = self.pool.begin().await?;

        let Some(mut member) =
            sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(MemberWrite::NotFound);
        };

        if input.student_id != member.student_id {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM members WHERE student_id = $1 AND id <> $2)",
            )
            .bind(&input.student_id)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Ok(MemberWrite::DuplicateStudentId);
            }
        }

        member.apply_update(input);

        let result = sqlx::query(
            r#"
            UPDATE members
            SET name = $1, student_id = $2, grade = $3, picture_base64 = $4, email = $5, phone = $6
            WHERE id = $7
            "#,
        )
        .bind(&member.name)
        .bind(&member.student_id)
        .bind(&member.grade)
        .bind(&member.picture_base64)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(id)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(MemberWrite::DuplicateStudentId),
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(MemberWrite::Written(member))
    }

    async fn delete_member(&self, id: &str) -> AppResult<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM members WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let borrowing: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM transactions WHERE member_id = $1 AND status IN {})",
            ACTIVE_STATUSES
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if borrowing {
            return Ok(DeleteOutcome::ActiveBorrow);
        }

        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(if result.rows_affected() == 0 {
            DeleteOutcome::NotFound
        } else {
            DeleteOutcome::Deleted
        })
    }

    async fn search_members(&self, query: &MemberQuery, limit: i64) -> AppResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT * FROM members
            WHERE ($1::text IS NULL OR name ILIKE $1 OR student_id ILIKE $1 OR email ILIKE $1)
              AND ($2::text IS NULL OR grade ILIKE $2)
            ORDER BY created_at
            LIMIT $3
            "#,
        )
        .bind(query.text().map(like_pattern))
        .bind(query.grade().map(like_pattern))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn count_members(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn checkout(&self, transaction: &Transaction) -> AppResult<CheckoutOutcome> {
        let mut tx = self.pool.begin().await?;

        let available: Option<i32> = sqlx::query_scalar(
            "SELECT available_copies FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(&transaction.book_id)
        .fetch_optional(&mut *tx)
        .await?;

        match available {
            None => return Ok(CheckoutOutcome::BookNotFound),
            Some(copies) if copies <= 0 => return Ok(CheckoutOutcome::Unavailable),
            Some(_) => {}
        }

        let member_exists = sqlx::query("SELECT id FROM members WHERE id = $1 FOR SHARE")
            .bind(&transaction.member_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !member_exists {
            return Ok(CheckoutOutcome::MemberNotFound);
        }

        let already_borrowed: bool = sqlx::query_scalar(&format!(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM transactions
                WHERE book_id = $1 AND member_id = $2 AND status IN {}
            )
            "#,
            ACTIVE_STATUSES
        ))
        .bind(&transaction.book_id)
        .bind(&transaction.member_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_borrowed {
            return Ok(CheckoutOutcome::AlreadyBorrowed);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO transactions (id, book_id, member_id, checkout_date, due_date, return_date, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.book_id)
        .bind(&transaction.member_id)
        .bind(transaction.checkout_date)
        .bind(transaction.due_date)
        .bind(transaction.return_date)
        .bind(transaction.status.as_str())
        .bind(transaction.created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(CheckoutOutcome::AlreadyBorrowed),
            Err(e) => return Err(e.into()),
        }

        sqlx::query("UPDATE books SET available_copies = available_copies - 1 WHERE id = $1")
            .bind(&transaction.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(CheckoutOutcome::Created)
    }

    async fn return_transaction(
        &self,
        id: &str,
        returned_at: DateTime<Utc>,
    ) -> AppResult<ReturnOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(ReturnOutcome::NotFound);
        };

        let mut transaction = Transaction::try_from(row)?;
        if !transaction.is_active() {
            return Ok(ReturnOutcome::NotBorrowed);
        }
        transaction.mark_returned(returned_at);

        sqlx::query("UPDATE transactions SET status = $1, return_date = $2 WHERE id = $3")
            .bind(transaction.status.as_str())
            .bind(returned_at)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE books SET available_copies = LEAST(available_copies + 1, total_copies) WHERE id = $1",
        )
        .bind(&transaction.book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ReturnOutcome::Returned(transaction))
    }

    async fn list_transactions(&self, limit: i64) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn mark_overdue(&self, id: &str) -> AppResult<()> {
        sqlx::query("UPDATE transactions SET status = $1 WHERE id = $2 AND status = $3")
            .bind(TransactionStatus::Overdue.as_str())
            .bind(id)
            .bind(TransactionStatus::Borrowed.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM transactions WHERE status IN {} AND due_date < $1",
            ACTIVE_STATUSES
        ))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
