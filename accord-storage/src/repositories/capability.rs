//! Capability repository

use accord_core::{Capability, CapabilityId};

use crate::error::Result;
use crate::repository::{Identified, InMemoryRepository};

impl Identified for Capability {
    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn entity_type() -> &'static str {
        "Capability"
    }
}

#[derive(Debug, Clone, Default)]
pub struct CapabilityRepository {
    inner: InMemoryRepository<Capability>,
}

impl CapabilityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CapabilityId) -> Result<Capability> {
        self.inner.get(id)
    }

    pub fn save(&self, capability: Capability) -> Result<()> {
        self.inner.save(capability)
    }

    pub fn delete(&self, id: CapabilityId) -> Result<()> {
        self.inner.delete(id)
    }

    pub fn list(&self) -> Vec<Capability> {
        self.inner.list()
    }

    pub fn find_by_category(&self, category: &str) -> Vec<Capability> {
        self.inner
            .list()
            .into_iter()
            .filter(|c| c.category == category)
            .collect()
    }
}
