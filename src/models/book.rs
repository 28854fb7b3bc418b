//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::contains_ignore_case;

/// Book record, one row per title with a copy count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: String,
    /// Number of physical copies owned
    pub total_copies: i32,
    /// Copies not currently checked out, never above `total_copies`
    pub available_copies: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Book create / full update request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: String,
    #[validate(range(min = 0, message = "total_copies must not be negative"))]
    pub total_copies: i32,
    #[serde(default)]
    pub description: Option<String>,
}

/// Book search query
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct BookQuery {
    /// Matched against title, author and ISBN
    pub q: Option<String>,
    pub genre: Option<String>,
    /// Only books with at least one available copy.
    /// Accepts `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off`.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub available_only: Option<bool>,
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        other => Err(de::Error::invalid_value(
            de::Unexpected::Str(other),
            &"a boolean flag",
        )),
    }
}

/// Aggregated copy counts over the whole catalog
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct BookTotals {
    pub books: i64,
    pub total_copies: i64,
    pub available_copies: i64,
}

impl Book {
    /// Build a new book; all copies start available
    pub fn new(input: BookInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            author: input.author,
            isbn: input.isbn,
            genre: input.genre,
            total_copies: input.total_copies,
            available_copies: input.total_copies,
            description: input.description,
            created_at: now,
        }
    }

    /// Replace the editable fields, keeping the borrowed count when the
    /// number of copies changes.
    pub fn apply_update(&mut self, input: &BookInput) {
        if input.total_copies != self.total_copies {
            self.available_copies =
                rebalance_available(self.total_copies, self.available_copies, input.total_copies);
            self.total_copies = input.total_copies;
        }
        self.title = input.title.clone();
        self.author = input.author.clone();
        self.isbn = input.isbn.clone();
        self.genre = input.genre.clone();
        self.description = input.description.clone();
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Available copies after `total_copies` moves from `old_total` to `new_total`
pub fn rebalance_available(old_total: i32, old_available: i32, new_total: i32) -> i32 {
    let borrowed = old_total - old_available;
    (new_total - borrowed).max(0)
}

impl BookQuery {
    pub fn text(&self) -> Option<&str> {
        self.q.as_deref().filter(|q| !q.is_empty())
    }

    pub fn genre(&self) -> Option<&str> {
        self.genre.as_deref().filter(|g| !g.is_empty())
    }

    pub fn available_only(&self) -> bool {
        self.available_only.unwrap_or(false)
    }

    /// In-process evaluation of the query
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(q) = self.text() {
            let hit = contains_ignore_case(&book.title, q)
                || contains_ignore_case(&book.author, q)
                || contains_ignore_case(&book.isbn, q);
            if !hit {
                return false;
            }
        }
        if let Some(genre) = self.genre() {
            if !contains_ignore_case(&book.genre, genre) {
                return false;
            }
        }
        !self.available_only() || book.is_available()
    }
}
