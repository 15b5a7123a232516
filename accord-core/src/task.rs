//! Task domain model

use crate::error::{Error, Result};
use crate::ids::{CapabilityId, TaskId, TeamId};
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Status of a task across its lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Created,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

/// A unit of work that a Team is formed to carry out
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub required_capabilities: HashSet<CapabilityId>,
    pub required_roles: Vec<Role>,
    pub priority: u8,
    pub complexity: u8,
    pub min_team_size: u32,
    pub max_team_size: u32,
    pub status: TaskStatus,
    pub assigned_team: Option<TeamId>,
}

impl Task {
    pub fn builder() -> TaskBuilder {
        TaskBuilder::default()
    }

    pub fn assign_team(&mut self, team_id: TeamId) {
        self.assigned_team = Some(team_id);
        self.status = TaskStatus::Assigned;
    }
}

#[derive(Debug, Default)]
pub struct TaskBuilder {
    name: Option<String>,
    description: String,
    required_capabilities: HashSet<CapabilityId>,
    required_roles: Vec<Role>,
    priority: Option<u8>,
    complexity: Option<u8>,
    min_team_size: u32,
    max_team_size: u32,
}

impl TaskBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required_capabilities(mut self, caps: impl IntoIterator<Item = CapabilityId>) -> Self {
        self.required_capabilities.extend(caps);
        self
    }

    pub fn required_role(mut self, role: Role) -> Self {
        self.required_roles.push(role);
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn complexity(mut self, complexity: u8) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn team_size(mut self, min: u32, max: u32) -> Self {
        self.min_team_size = min;
        self.max_team_size = max;
        self
    }

    pub fn build(self) -> Result<Task> {
        let name = self
            .name
            .ok_or_else(|| Error::invalid_argument("task name is required"))?;
        let priority = self.priority.unwrap_or(5);
        if !(1..=10).contains(&priority) {
            return Err(Error::invalid_argument("task priority must be in 1..=10"));
        }
        let complexity = self.complexity.unwrap_or(5);
        if !(1..=10).contains(&complexity) {
            return Err(Error::invalid_argument(
                "task complexity must be in 1..=10",
            ));
        }
        Ok(Task {
            id: Uuid::new_v4(),
            name,
            description: self.description,
            required_capabilities: self.required_capabilities,
            required_roles: self.required_roles,
            priority,
            complexity,
            min_team_size: self.min_team_size,
            max_team_size: self.max_team_size,
            status: TaskStatus::Created,
            assigned_team: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_out_of_range_priority() {
        let result = Task::builder().name("t").priority(11).build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_defaults_priority_and_complexity() {
        let task = Task::builder().name("t").build().unwrap();
        assert_eq!(task.priority, 5);
        assert_eq!(task.complexity, 5);
        assert_eq!(task.status, TaskStatus::Created);
    }
}
