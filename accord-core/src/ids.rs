//! Identifier type aliases
//!
//! The spec's cyclic references (Team <-> Role <-> Agent) are modeled as ids
//! rather than in-memory back-pointers, per the design note in `spec.md`
//! §9 — the entity store is responsible for referential integrity, not the
//! in-memory representation.

use uuid::Uuid;

pub type AgentId = Uuid;
pub type CapabilityId = Uuid;
pub type RoleId = Uuid;
pub type TaskId = Uuid;
pub type TeamId = Uuid;
pub type ContextId = Uuid;
pub type VersionId = Uuid;
pub type NegotiationId = Uuid;
pub type MessageId = Uuid;
