//! Negotiation Engine (C4): a round-based multi-party protocol over
//! proposals, with pluggable conflict-resolution strategies and an
//! optional hook to mirror a resolved agreement into a Shared Context.

pub mod engine;
pub mod error;
pub mod resolution;

pub use engine::{ContextSink, InitiateOptions, NegotiationEngine, NegotiationReport};
pub use error::{Error, Result};
pub use resolution::{compromise, optimization, priority_based, voting, ProposalEntry};
