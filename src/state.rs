use std::sync::Arc;
use std::time::Instant;

use crate::db::{BlogRepository, DynBlogRepository};

#[derive(Clone)]
pub struct AppState {
    /// Authoritative blog store (JSON file or Postgres)
    repo: DynBlogRepository,
    started_at: Instant,
}

impl AppState {
    pub fn new(repo: DynBlogRepository) -> Self {
        Self {
            repo,
            started_at: Instant::now(),
        }
    }

    pub fn from_repository(repo: impl BlogRepository) -> Self {
        Self::new(Arc::new(repo))
    }

    pub fn repo(&self) -> &dyn BlogRepository {
        self.repo.as_ref()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
