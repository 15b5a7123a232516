//! Shared Context Engine (C2): a versioned content tree with access
//! control, subscribe/notify, fork, merge, revert, and diff.
//!
//! Business logic only — persistence is the `accord_storage` repositories
//! this crate is handed at construction, and the notification/archival/
//! compression sinks are injected abstractly per `spec.md` §6.

pub mod diff;
pub mod engine;
pub mod error;
pub mod merge;

pub use diff::{ContextDiff, ModifiedLeaf, VersionMeta};
pub use engine::ContextEngine;
pub use error::{Error, Result};
pub use merge::MergeResolution;
