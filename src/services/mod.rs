//! Business logic services

pub mod catalog;
pub mod circulation;
pub mod members;
pub mod search;
pub mod stats;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub circulation: circulation::CirculationService,
    pub search: search::SearchService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            circulation: circulation::CirculationService::new(repository.clone()),
            search: search::SearchService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
        }
    }
}
