//! Catalog and directory search

use crate::{
    error::AppResult,
    models::{Book, BookQuery, Member, MemberQuery},
    repository::{Repository, LIST_LIMIT},
};

#[derive(Clone)]
pub struct SearchService {
    repository: Repository,
}

impl SearchService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.search_books(query, LIST_LIMIT).await
    }

    pub async fn search_members(&self, query: &MemberQuery) -> AppResult<Vec<Member>> {
        self.repository.search_members(query, LIST_LIMIT).await
    }
}
