//! Book catalog service

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookInput},
    repository::{DeleteOutcome, Repository, LIST_LIMIT},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.list_books(LIST_LIMIT).await
    }

    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        self.repository
            .get_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Create a book with every copy available
    pub async fn create_book(&self, input: BookInput) -> AppResult<Book> {
        input.validate()?;

        let book = Book::new(input, Utc::now());
        self.repository.insert_book(&book).await?;

        tracing::info!(
            "Catalog: created book id={} ({} copies)",
            book.id,
            book.total_copies
        );
        Ok(book)
    }

    /// Replace a book's fields; a changed copy count keeps the borrowed copies
    /// accounted for.
    pub async fn update_book(&self, id: &str, input: BookInput) -> AppResult<Book> {
        input.validate()?;

        self.repository
            .update_book(id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        match self.repository.delete_book(id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!("Catalog: deleted book id={}", id);
                Ok(())
            }
            DeleteOutcome::NotFound => Err(AppError::NotFound("Book not found".to_string())),
            DeleteOutcome::ActiveBorrow => {
                tracing::warn!("Catalog: refused to delete borrowed book id={}", id);
                Err(AppError::Conflict(
                    "Cannot delete book that is currently borrowed".to_string(),
                ))
            }
        }
    }
}
