//! Version comparison types returned by `CompareVersions`

use accord_core::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about one side of a version comparison
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionMeta {
    pub version_id: accord_core::VersionId,
    pub timestamp: DateTime<Utc>,
    pub agent_id: accord_core::AgentId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModifiedLeaf {
    pub from: Value,
    pub to: Value,
}

/// The result of comparing the reconstructed content at two versions,
/// computed over flattened (slash-joined) leaf paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextDiff {
    pub added: Vec<(String, Value)>,
    pub removed: Vec<(String, Value)>,
    pub modified: Vec<(String, ModifiedLeaf)>,
    pub v1_meta: VersionMeta,
    pub v2_meta: VersionMeta,
}
