//! Scoring strategies used to match agents to roles (spec.md §4.3).

use accord_core::{Agent, Error, Result, Role};

/// The closed set of team-formation strategies. New strategies are a code
/// change, not a runtime-configurable policy, per the spec's design note
/// on strategy pluggability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormationStrategy {
    Capability,
    Performance,
    Cost,
    Specialization,
    Balanced,
    Diversity,
}

impl FormationStrategy {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_uppercase().as_str() {
            "CAPABILITY" => Ok(Self::Capability),
            "PERFORMANCE" => Ok(Self::Performance),
            "COST" => Ok(Self::Cost),
            "SPECIALIZATION" => Ok(Self::Specialization),
            "BALANCED" => Ok(Self::Balanced),
            "DIVERSITY" => Ok(Self::Diversity),
            other => Err(Error::invalid_argument(format!("unknown formation strategy: {other}"))),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Performance => "PERFORMANCE",
            Self::Cost => "COST",
            Self::Specialization => "SPECIALIZATION",
            Self::Balanced => "BALANCED",
            Self::Diversity => "DIVERSITY",
        }
    }

    /// Strategies invoked by `Recommend`, in the order the spec lists them.
    pub fn recommend_order() -> [FormationStrategy; 5] {
        [
            FormationStrategy::Capability,
            FormationStrategy::Performance,
            FormationStrategy::Cost,
            FormationStrategy::Specialization,
            FormationStrategy::Balanced,
        ]
    }

    /// The per-role score of `agent` under this strategy. `Diversity` has
    /// no per-role formula (it runs its own set-cover algorithm) so it is
    /// not handled here.
    pub fn score(&self, agent: &Agent, role: &Role) -> f64 {
        let cap_match = agent.capability_match(&role.required_capabilities);
        match self {
            FormationStrategy::Capability => cap_match,
            FormationStrategy::Performance => 0.3 * cap_match + 0.7 * (agent.performance_rating / 10.0),
            FormationStrategy::Cost => {
                0.3 * cap_match + 0.7 * (1.0 - (agent.cost_per_token / 0.01).min(1.0))
            }
            FormationStrategy::Specialization => {
                0.3 * cap_match + 0.7 * spec_match(agent, role)
            }
            FormationStrategy::Balanced => {
                0.4 * cap_match
                    + 0.25 * (agent.performance_rating / 10.0)
                    + 0.25 * spec_match(agent, role)
                    + 0.1 * (1.0 - (agent.cost_per_token / 0.01).min(1.0))
            }
            FormationStrategy::Diversity => cap_match,
        }
    }
}

/// `specMatch(A, role)`: how well an agent's stated specialization aligns
/// with a role's name/categories.
pub fn spec_match(agent: &Agent, role: &Role) -> f64 {
    if agent.specialization == role.name {
        return 1.0;
    }
    if agent.specialization.contains(&role.name) || role.name.contains(&agent.specialization) {
        return 0.7;
    }
    if role.categories.contains(&agent.specialization) {
        return 0.5;
    }
    0.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn spec_match_exact() {
        let agent = Agent::new("a", "Backend Engineer");
        let role = Role::new("Backend Engineer", 1);
        assert_eq!(spec_match(&agent, &role), 1.0);
    }

    #[test]
    fn spec_match_substring() {
        let agent = Agent::new("a", "Backend");
        let role = Role::new("Backend Engineer", 1);
        assert_eq!(spec_match(&agent, &role), 0.7);
    }

    #[test]
    fn spec_match_category() {
        let agent = Agent::new("a", "backend");
        let role = Role::new("Engineer", 1).with_categories(["backend".to_string()]);
        assert_eq!(spec_match(&agent, &role), 0.5);
    }

    #[test]
    fn spec_match_none() {
        let agent = Agent::new("a", "frontend");
        let role = Role::new("Backend Engineer", 1);
        assert_eq!(spec_match(&agent, &role), 0.1);
    }

    #[test]
    fn cost_score_clamped_at_zero() {
        let agent = Agent::new("a", "x").with_cost_per_token(0.02);
        let role = Role::new("r", 1);
        let required: HashSet<_> = HashSet::new();
        assert_eq!(role.required_capabilities, required);
        let score = FormationStrategy::Cost.score(&agent, &role);
        // cap_match is 1 (empty requirement), cost term clamps to 0
        assert!((score - 0.3).abs() < 1e-9);
    }
}
