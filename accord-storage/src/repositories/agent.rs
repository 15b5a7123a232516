//! Agent repository

use accord_core::{Agent, AgentId, CapabilityId};
use tracing::debug;

use crate::error::Result;
use crate::repository::{Identified, InMemoryRepository};

impl Identified for Agent {
    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn entity_type() -> &'static str {
        "Agent"
    }
}

#[derive(Debug, Clone, Default)]
pub struct AgentRepository {
    inner: InMemoryRepository<Agent>,
}

impl AgentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: AgentId) -> Result<Agent> {
        self.inner.get(id)
    }

    pub fn save(&self, agent: Agent) -> Result<()> {
        debug!(agent_id = %agent.id, "saving agent");
        self.inner.save(agent)
    }

    pub fn delete(&self, id: AgentId) -> Result<()> {
        self.inner.delete(id)
    }

    pub fn list(&self) -> Vec<Agent> {
        self.inner.list()
    }

    pub fn find_available(&self) -> Vec<Agent> {
        self.inner.list().into_iter().filter(|a| a.available).collect()
    }

    pub fn find_by_capability(&self, capability: CapabilityId) -> Vec<Agent> {
        self.inner
            .list()
            .into_iter()
            .filter(|a| a.capabilities.contains(&capability))
            .collect()
    }
}
