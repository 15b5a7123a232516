//! Shared context domain model
//!
//! The engine-level operations (create/update/merge/fork/...) live in the
//! `accord-context` crate; this module only defines the data shapes and the
//! small amount of logic (access-level checks, version-chain reconstruction)
//! that is pure function of the data and doesn't need a store.

use crate::ids::{AgentId, ContextId, VersionId};
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Level of access an agent has been granted on a context
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessLevel {
    ReadOnly,
    ReadWrite,
    Admin,
}

/// A grant of access to a context for one agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextAccess {
    pub agent_id: AgentId,
    pub access_level: AccessLevel,
    pub granted_at: DateTime<Utc>,
    pub granted_by: AgentId,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ContextAccess {
    pub fn new(agent_id: AgentId, access_level: AccessLevel, granted_by: AgentId) -> Self {
        Self {
            agent_id,
            access_level,
            granted_at: Utc::now(),
            granted_by,
            expires_at: None,
        }
    }

    pub fn expiring_in(mut self, duration: chrono::Duration) -> Self {
        self.expires_at = Some(Utc::now() + duration);
        self
    }

    /// Expired access is treated as absent, per the spec's access rules.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => now < expiry,
            None => true,
        }
    }
}

/// The kind of mutation recorded by a `ContextChange`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeOperation {
    Create,
    Update,
    Delete,
    Merge,
}

/// A single recorded mutation within a `ContextVersion`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextChange {
    pub operation: ChangeOperation,
    pub path: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub agent_id: AgentId,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

/// An immutable, appended-to version in a context's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextVersion {
    pub version_id: VersionId,
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    pub parent_version_id: Option<VersionId>,
    pub changes: Vec<ContextChange>,
    pub metadata: HashMap<String, String>,
    pub content_hash: String,
}

impl ContextVersion {
    pub fn new(
        agent_id: AgentId,
        parent_version_id: Option<VersionId>,
        changes: Vec<ContextChange>,
        metadata: HashMap<String, String>,
    ) -> Self {
        let content_hash = Self::hash_changes(&changes);
        Self {
            version_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            agent_id,
            parent_version_id,
            changes,
            metadata,
            content_hash,
        }
    }

    /// A deterministic (order-sensitive) hash of this version's changes,
    /// used as `content_hash`. This isn't cryptographic — it only needs to
    /// be stable for the same ordered change list.
    fn hash_changes(changes: &[ContextChange]) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        for change in changes {
            change.operation.hash_discriminant().hash(&mut hasher);
            change.path.hash(&mut hasher);
            if let Ok(serialized) = serde_json::to_string(&change.new_value) {
                serialized.hash(&mut hasher);
            }
        }
        format!("{:x}", hasher.finish())
    }
}

impl ChangeOperation {
    fn hash_discriminant(&self) -> u8 {
        match self {
            ChangeOperation::Create => 0,
            ChangeOperation::Update => 1,
            ChangeOperation::Delete => 2,
            ChangeOperation::Merge => 3,
        }
    }
}

/// A versioned, access-controlled content tree shared by a set of agents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedContext {
    pub id: ContextId,
    pub name: String,
    pub context_type: String,
    pub owner_id: AgentId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_version_id: VersionId,
    pub content: Value,
    pub access_control: Vec<ContextAccess>,
    pub subscribers: HashSet<AgentId>,
    pub metadata: HashMap<String, Value>,
    pub is_compressed: bool,
    /// Optimistic-concurrency counter bumped on every committed write.
    pub version_counter: u64,
}

impl SharedContext {
    pub fn new(
        name: impl Into<String>,
        context_type: impl Into<String>,
        owner_id: AgentId,
        initial_version_id: VersionId,
        initial_content: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            context_type: context_type.into(),
            owner_id,
            created_at: now,
            updated_at: now,
            current_version_id: initial_version_id,
            content: initial_content,
            access_control: Vec::new(),
            subscribers: HashSet::from([owner_id]),
            metadata: HashMap::new(),
            is_compressed: false,
            version_counter: 0,
        }
    }

    /// Effective access level for `agent_id`, honoring the owner-is-admin
    /// rule and expiry. `None` means no access at all.
    pub fn effective_access(&self, agent_id: AgentId, now: DateTime<Utc>) -> Option<AccessLevel> {
        if agent_id == self.owner_id {
            return Some(AccessLevel::Admin);
        }
        self.access_control
            .iter()
            .find(|a| a.agent_id == agent_id && a.is_active(now))
            .map(|a| a.access_level)
    }

    pub fn can_read(&self, agent_id: AgentId, now: DateTime<Utc>) -> bool {
        self.effective_access(agent_id, now).is_some()
    }

    pub fn can_write(&self, agent_id: AgentId, now: DateTime<Utc>) -> bool {
        matches!(
            self.effective_access(agent_id, now),
            Some(AccessLevel::ReadWrite) | Some(AccessLevel::Admin)
        )
    }

    pub fn can_admin(&self, agent_id: AgentId, now: DateTime<Utc>) -> bool {
        matches!(self.effective_access(agent_id, now), Some(AccessLevel::Admin))
    }
}
