//! Context repository, plus the append-only version chain each Context's
//! history lives in.
//!
//! Versions are stored separately from the `SharedContext` row itself: the
//! row always holds the reconstructed current content, while the chain
//! lets `GetContextVersion`/`CompareVersions`/`RevertToVersion` replay
//! history without re-deriving it from the row.

use accord_core::{ContextId, ContextVersion, SharedContext, VersionId};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::repository::{Identified, InMemoryRepository, Versioned};

impl Identified for SharedContext {
    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn entity_type() -> &'static str {
        "Context"
    }
}

impl Versioned for SharedContext {
    fn version(&self) -> u64 {
        self.version_counter
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextRepository {
    inner: InMemoryRepository<SharedContext>,
}

impl ContextRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ContextId) -> Result<SharedContext> {
        self.inner.get(id)
    }

    pub fn save_versioned(&self, mut context: SharedContext, expected_version: u64) -> Result<()> {
        debug!(context_id = %context.id, expected_version, "saving context");
        context.version_counter = expected_version + 1;
        self.inner.save_versioned(context, expected_version)
    }

    pub fn delete(&self, id: ContextId) -> Result<()> {
        self.inner.delete(id)
    }

    pub fn list(&self) -> Vec<SharedContext> {
        self.inner.list()
    }

    pub fn search_by_name(&self, query: &str, context_type: Option<&str>) -> Vec<SharedContext> {
        let needle = query.to_lowercase();
        self.inner
            .list()
            .into_iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .filter(|c| context_type.map(|t| c.context_type == t).unwrap_or(true))
            .collect()
    }
}

/// Append-only store of `ContextVersion` chains, keyed by context id.
#[derive(Debug, Clone, Default)]
pub struct ContextVersionRepository {
    chains: Arc<DashMap<ContextId, Vec<ContextVersion>>>,
}

impl ContextVersionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, context_id: ContextId, version: ContextVersion) {
        self.chains.entry(context_id).or_default().push(version);
    }

    pub fn chain(&self, context_id: ContextId) -> Vec<ContextVersion> {
        self.chains
            .get(&context_id)
            .map(|chain| chain.clone())
            .unwrap_or_default()
    }

    pub fn get_version(&self, context_id: ContextId, version_id: VersionId) -> Option<ContextVersion> {
        self.chains
            .get(&context_id)?
            .iter()
            .find(|v| v.version_id == version_id)
            .cloned()
    }
}
