//! Capability domain model

use crate::ids::CapabilityId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, immutable-after-creation skill agents can possess and roles can
/// require.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Capability {
    pub id: CapabilityId,
    pub name: String,
    pub category: String,
    pub complexity_level: u32,
    pub is_core: bool,
}

impl Capability {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category: category.into(),
            complexity_level: 0,
            is_core: false,
        }
    }

    pub fn with_complexity_level(mut self, level: u32) -> Self {
        self.complexity_level = level;
        self
    }

    pub fn core(mut self) -> Self {
        self.is_core = true;
        self
    }
}
