//! Generic in-memory repository, shared by every entity-specific repository
//! in `repositories/`. No business logic lives here — only `get`/`save`/
//! `delete`/`list` plus the optimistic-concurrency save used by Contexts and
//! Teams.

use accord_core::Error;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;

/// Anything stored in a repository carries a stable id and knows its own
/// kind name, so `NotFound` errors can report something useful.
pub trait Identified {
    fn id(&self) -> Uuid;
    fn entity_type() -> &'static str;
}

/// Entities subject to optimistic concurrency control carry a version
/// counter that `save_versioned` checks against the caller's expected value.
pub trait Versioned: Identified {
    fn version(&self) -> u64;
}

#[derive(Debug)]
pub struct InMemoryRepository<V> {
    entities: Arc<DashMap<Uuid, V>>,
}

impl<V> Default for InMemoryRepository<V> {
    fn default() -> Self {
        Self {
            entities: Arc::new(DashMap::new()),
        }
    }
}

impl<V> Clone for InMemoryRepository<V> {
    fn clone(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
        }
    }
}

impl<V: Identified + Clone> InMemoryRepository<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Uuid) -> Result<V> {
        self.entities
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::not_found(V::entity_type(), id.to_string()).into())
    }

    pub fn save(&self, entity: V) -> Result<()> {
        self.entities.insert(entity.id(), entity);
        Ok(())
    }

    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.entities
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(V::entity_type(), id.to_string()).into())
    }

    pub fn list(&self) -> Vec<V> {
        self.entities.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn exists(&self, id: Uuid) -> bool {
        self.entities.contains_key(&id)
    }
}

impl<V: Versioned + Clone> InMemoryRepository<V> {
    /// Atomically replace the stored entity with `entity`, but only if the
    /// caller's `expected_version` matches what's currently stored. Uses
    /// `DashMap`'s per-shard entry lock so the check-and-set is atomic
    /// against concurrent writers racing on the same key.
    pub fn save_versioned(&self, entity: V, expected_version: u64) -> Result<()> {
        let id = entity.id();
        match self.entities.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let current = occupied.get().version();
                if current != expected_version {
                    return Err(Error::StaleVersion {
                        expected: expected_version.to_string(),
                        found: current.to_string(),
                    }
                    .into());
                }
                occupied.insert(entity);
                Ok(())
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                if expected_version != 0 {
                    return Err(Error::StaleVersion {
                        expected: expected_version.to_string(),
                        found: "0".to_string(),
                    }
                    .into());
                }
                vacant.insert(entity);
                Ok(())
            }
        }
    }
}
