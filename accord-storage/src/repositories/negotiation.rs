//! Negotiation repository

use accord_core::{Negotiation, NegotiationId, NegotiationStatus};

use crate::error::Result;
use crate::repository::{Identified, InMemoryRepository};

impl Identified for Negotiation {
    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn entity_type() -> &'static str {
        "Negotiation"
    }
}

#[derive(Debug, Clone, Default)]
pub struct NegotiationRepository {
    inner: InMemoryRepository<Negotiation>,
}

impl NegotiationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NegotiationId) -> Result<Negotiation> {
        self.inner.get(id)
    }

    pub fn save(&self, negotiation: Negotiation) -> Result<()> {
        self.inner.save(negotiation)
    }

    pub fn delete(&self, id: NegotiationId) -> Result<()> {
        self.inner.delete(id)
    }

    pub fn list(&self) -> Vec<Negotiation> {
        self.inner.list()
    }

    pub fn find_by_status(&self, status: NegotiationStatus) -> Vec<Negotiation> {
        self.inner
            .list()
            .into_iter()
            .filter(|n| n.status == status)
            .collect()
    }
}
