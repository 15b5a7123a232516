//! Team domain model

use crate::ids::{AgentId, CapabilityId, TaskId, TeamId};
use crate::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Lifecycle status of a Team
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TeamStatus {
    Forming,
    Active,
    Partial,
    Complete,
    Disbanded,
}

/// A group of agents assembled to carry out a Task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub task: TaskId,
    pub agents: HashSet<AgentId>,
    pub leader: Option<AgentId>,
    pub roles: Vec<Role>,
    pub capabilities: HashSet<CapabilityId>,
    pub status: TeamStatus,
    pub formation_strategy: String,
    pub performance_metrics: HashMap<String, f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency counter; bumped on every committed save.
    pub version_counter: u64,
}

impl Team {
    pub fn new(name: impl Into<String>, task: TaskId, formation_strategy: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            task,
            agents: HashSet::new(),
            leader: None,
            roles: Vec::new(),
            capabilities: HashSet::new(),
            status: TeamStatus::Forming,
            formation_strategy: formation_strategy.into(),
            performance_metrics: HashMap::new(),
            created_at: now,
            updated_at: now,
            version_counter: 0,
        }
    }

    /// Assign `agent_id` (who owns `agent_caps`) to `role`, maintaining the
    /// `team.capabilities == union(member capabilities)` invariant.
    pub fn assign_role(
        &mut self,
        role_index: usize,
        agent_id: AgentId,
        agent_caps: &HashSet<CapabilityId>,
    ) {
        self.roles[role_index].assign(agent_id, self.id);
        self.agents.insert(agent_id);
        self.capabilities.extend(agent_caps.iter().copied());
        self.updated_at = Utc::now();
    }

    pub fn set_leader(&mut self, agent_id: AgentId) {
        self.leader = Some(agent_id);
        self.updated_at = Utc::now();
    }

    /// Recompute `status` from role-fill state: `Complete` if every role is
    /// filled, `Partial` otherwise (an empty role list also counts as
    /// complete — there is nothing left to fill).
    pub fn finalize_status(&mut self) {
        let all_filled = self.roles.iter().all(|r| r.filled);
        self.status = if all_filled {
            TeamStatus::Complete
        } else {
            TeamStatus::Partial
        };
        self.updated_at = Utc::now();
    }

    pub fn activate(&mut self) {
        if self.status == TeamStatus::Complete {
            self.status = TeamStatus::Active;
            self.updated_at = Utc::now();
        }
    }

    /// Disband the team: mark it `DISBANDED` and clear role assignments.
    /// The Team row itself, and any Context/Negotiation history that
    /// references it, is left in place for audit per the data model's
    /// lifecycle note.
    pub fn disband(&mut self) {
        self.status = TeamStatus::Disbanded;
        for role in &mut self.roles {
            role.unassign();
        }
        self.agents.clear();
        self.leader = None;
        self.updated_at = Utc::now();
    }

    /// Verify the team invariant from the spec's testable properties:
    /// `team.capabilities == union(agent.capabilities)` is maintained by
    /// construction here; what we can check locally is that every assigned
    /// role's agent is a member of `agents`.
    pub fn check_role_membership_invariant(&self) -> bool {
        self.roles
            .iter()
            .filter(|r| r.filled)
            .all(|r| r.assigned_agent.map(|a| self.agents.contains(&a)).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    #[test]
    fn finalize_status_complete_when_all_roles_filled() {
        let mut team = Team::new("t1", Uuid::new_v4(), "CAPABILITY");
        let role = Role::new("r1", 1);
        team.roles.push(role);
        let agent = Uuid::new_v4();
        team.assign_role(0, agent, &HashSet::new());
        team.finalize_status();
        assert_eq!(team.status, TeamStatus::Complete);
        assert!(team.check_role_membership_invariant());
    }

    #[test]
    fn finalize_status_partial_when_role_unfilled() {
        let mut team = Team::new("t1", Uuid::new_v4(), "CAPABILITY");
        team.roles.push(Role::new("r1", 1));
        team.finalize_status();
        assert_eq!(team.status, TeamStatus::Partial);
    }

    #[test]
    fn disband_clears_assignments_but_keeps_team() {
        let mut team = Team::new("t1", Uuid::new_v4(), "CAPABILITY");
        let role = Role::new("r1", 1);
        team.roles.push(role);
        let agent = Uuid::new_v4();
        team.assign_role(0, agent, &HashSet::new());
        team.disband();
        assert_eq!(team.status, TeamStatus::Disbanded);
        assert!(team.agents.is_empty());
        assert!(!team.roles[0].filled);
    }
}
