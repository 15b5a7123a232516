//! Domain model, configuration, and error types shared by every Accord
//! coordination engine crate.

pub mod agent;
pub mod capability;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod negotiation;
pub mod role;
pub mod task;
pub mod team;
pub mod value;

pub use agent::Agent;
pub use capability::Capability;
pub use clock::{Clock, SharedClock, SystemClock, TestClock};
pub use config::{ContextConfig, NegotiationConfig, OptimizationEngineConfig, TeamFormationConfig};
pub use context::{AccessLevel, ChangeOperation, ContextAccess, ContextChange, ContextVersion, SharedContext};
pub use error::{Error, Result};
pub use ids::{
    AgentId, CapabilityId, ContextId, MessageId, NegotiationId, RoleId, TaskId, TeamId, VersionId,
};
pub use negotiation::{
    ConflictResolutionStrategy, MessageType, Negotiation, NegotiationMessage, NegotiationStatus,
    Proposal,
};
pub use role::Role;
pub use task::{Task, TaskBuilder, TaskStatus};
pub use team::{Team, TeamStatus};
pub use value::{Scalar, Value};
