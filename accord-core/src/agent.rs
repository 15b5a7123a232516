//! Agent domain model

use crate::ids::{AgentId, CapabilityId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A member of the coordination platform available for team assignment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub specialization: String,
    pub capabilities: HashSet<CapabilityId>,
    pub performance_rating: f64,
    pub collaboration_score: f64,
    pub cost_per_token: f64,
    pub available: bool,
}

impl Agent {
    pub fn new(name: impl Into<String>, specialization: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            specialization: specialization.into(),
            capabilities: HashSet::new(),
            performance_rating: 0.0,
            collaboration_score: 0.5,
            cost_per_token: 0.0,
            available: true,
        }
    }

    pub fn with_capability(mut self, capability: CapabilityId) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = CapabilityId>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn with_performance_rating(mut self, rating: f64) -> Self {
        self.performance_rating = rating.clamp(0.0, 10.0);
        self
    }

    pub fn with_cost_per_token(mut self, cost: f64) -> Self {
        self.cost_per_token = cost.max(0.0);
        self
    }

    /// Fraction of `required` present in this agent's capability set, in
    /// `[0, 1]`. An empty requirement set is trivially fully matched.
    pub fn capability_match(&self, required: &HashSet<CapabilityId>) -> f64 {
        if required.is_empty() {
            return 1.0;
        }
        let intersection = self.capabilities.intersection(required).count();
        intersection as f64 / required.len() as f64
    }

    pub fn has_all_capabilities(&self, required: &HashSet<CapabilityId>) -> bool {
        required.is_subset(&self.capabilities)
    }

    /// Update `collaboration_score` via an exponential moving average with
    /// `alpha = 0.3`, per the team feedback operation.
    pub fn apply_collaboration_feedback(&mut self, success_rating: f64) {
        let rating = success_rating.clamp(0.0, 1.0);
        self.collaboration_score = 0.3 * rating + 0.7 * self.collaboration_score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_match_empty_requirement_is_full_match() {
        let agent = Agent::new("a1", "backend");
        assert_eq!(agent.capability_match(&HashSet::new()), 1.0);
    }

    #[test]
    fn capability_match_partial() {
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        let agent = Agent::new("a1", "backend").with_capability(c1);
        let mut required = HashSet::new();
        required.insert(c1);
        required.insert(c2);
        assert_eq!(agent.capability_match(&required), 0.5);
    }

    #[test]
    fn collaboration_feedback_ema() {
        let mut agent = Agent::new("a1", "backend");
        agent.collaboration_score = 0.5;
        agent.apply_collaboration_feedback(1.0);
        assert!((agent.collaboration_score - 0.65).abs() < 1e-9);
    }
}
