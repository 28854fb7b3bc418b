//! Dashboard statistics

use chrono::Utc;

use crate::{error::AppResult, models::DashboardStats, repository::Repository};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Catalog-wide counters. Purely a read: overdue transactions are counted
    /// but not rewritten.
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let books = self.repository.book_totals().await?;
        let members = self.repository.count_members().await?;
        let overdue = self.repository.count_overdue(Utc::now()).await?;

        Ok(DashboardStats::new(books, members, overdue))
    }

    /// Store connectivity check for readiness probes
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
