//! Role domain model

use crate::ids::{AgentId, CapabilityId, RoleId, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A position on a team, with the capabilities it requires and (once
/// filled) the agent assigned to it. A Role belongs to exactly one Team
/// once assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub required_capabilities: HashSet<CapabilityId>,
    pub priority: u32,
    pub categories: HashSet<String>,
    pub filled: bool,
    pub assigned_agent: Option<AgentId>,
    pub team: Option<TeamId>,
}

impl Role {
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            required_capabilities: HashSet::new(),
            priority,
            categories: HashSet::new(),
            filled: false,
            assigned_agent: None,
            team: None,
        }
    }

    pub fn with_required_capabilities(
        mut self,
        caps: impl IntoIterator<Item = CapabilityId>,
    ) -> Self {
        self.required_capabilities.extend(caps);
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = String>) -> Self {
        self.categories.extend(categories);
        self
    }

    pub fn assign(&mut self, agent_id: AgentId, team_id: TeamId) {
        self.assigned_agent = Some(agent_id);
        self.team = Some(team_id);
        self.filled = true;
    }

    pub fn unassign(&mut self) {
        self.assigned_agent = None;
        self.filled = false;
    }
}
