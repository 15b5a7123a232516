//! Team repository
//!
//! Teams are subject to optimistic concurrency: `save_versioned` enforces
//! the version counter a caller read hasn't been superseded, per the
//! Entity Store's contract.

use accord_core::{Team, TeamId, TeamStatus};
use tracing::debug;

use crate::error::Result;
use crate::repository::{Identified, InMemoryRepository, Versioned};

impl Identified for Team {
    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn entity_type() -> &'static str {
        "Team"
    }
}

impl Versioned for Team {
    fn version(&self) -> u64 {
        self.version_counter
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeamRepository {
    inner: InMemoryRepository<Team>,
}

impl TeamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TeamId) -> Result<Team> {
        self.inner.get(id)
    }

    /// Save with the version the caller read; bumps the counter on success.
    pub fn save_versioned(&self, mut team: Team, expected_version: u64) -> Result<()> {
        debug!(team_id = %team.id, expected_version, "saving team");
        team.version_counter = expected_version + 1;
        self.inner.save_versioned(team, expected_version)
    }

    pub fn delete(&self, id: TeamId) -> Result<()> {
        self.inner.delete(id)
    }

    pub fn list(&self) -> Vec<Team> {
        self.inner.list()
    }

    pub fn find_by_status(&self, status: TeamStatus) -> Vec<Team> {
        self.inner.list().into_iter().filter(|t| t.status == status).collect()
    }

    pub fn find_by_task(&self, task_id: accord_core::TaskId) -> Vec<Team> {
        self.inner.list().into_iter().filter(|t| t.task == task_id).collect()
    }
}
