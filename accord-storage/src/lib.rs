//! Entity store for the Accord coordination engine: in-memory, versioned
//! repositories per entity kind, plus the outbound sink abstractions the
//! engines push notifications, archival, and compression through.
//!
//! No business logic lives here — callers (the context/teams/negotiation
//! crates) enforce access rules and algorithms; this crate only guarantees
//! atomic per-entity reads/writes and the optimistic-concurrency contract
//! on Contexts and Teams.

pub mod error;
pub mod repositories;
pub mod repository;
pub mod sinks;

pub use error::{Error, Result};
pub use repositories::{
    AgentRepository, CapabilityRepository, ContextRepository, ContextVersionRepository,
    NegotiationRepository, TaskRepository, TeamRepository,
};
pub use repository::{Identified, InMemoryRepository, Versioned};
pub use sinks::{
    ArchivalSink, CompressionSink, ContextChangedEvent, NoopSink, NotificationDispatcher,
    NotificationSink,
};

/// Re-export core types for convenience, the way the teacher's storage
/// crate re-exports its core crate.
pub use accord_core as core;
