//! The `DIVERSITY` formation strategy (spec.md §4.3): greedy set cover
//! over required capabilities, domain-bucketed roles, then a fit pass.

use std::collections::HashSet;

use accord_core::{Agent, AgentId, Capability, CapabilityId, Role};

use crate::strategy::spec_match;

/// Domain buckets from the glossary, in the authoritative matching order:
/// the first bucket whose keyword substring matches a capability's name
/// wins.
pub const DOMAIN_BUCKETS: &[(&str, &[&str])] = &[
    ("Reasoning", &["reason", "logic", "inference", "deduction"]),
    ("Memory", &["memory", "recall", "storage"]),
    ("Perception", &["perceive", "detect", "sense", "observe"]),
    ("Communication", &["communicate", "language", "express"]),
];

/// Everything that doesn't match an earlier bucket falls into Domain
/// Knowledge, the catch-all named in the glossary.
pub const DOMAIN_KNOWLEDGE: &str = "Domain Knowledge";

/// Classify a capability by name into its domain bucket, case-insensitive
/// substring match, first bucket in declared order wins.
pub fn classify_domain(capability_name: &str) -> &'static str {
    let lower = capability_name.to_lowercase();
    for (domain, keywords) in DOMAIN_BUCKETS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return domain;
        }
    }
    DOMAIN_KNOWLEDGE
}

/// Partition `required` capabilities into non-empty domain buckets,
/// preserving declared bucket order.
pub fn partition_by_domain(
    required: &HashSet<CapabilityId>,
    capabilities: &[Capability],
) -> Vec<(&'static str, HashSet<CapabilityId>)> {
    let mut buckets: Vec<(&'static str, HashSet<CapabilityId>)> = DOMAIN_BUCKETS
        .iter()
        .map(|(domain, _)| (*domain, HashSet::new()))
        .collect();
    buckets.push((DOMAIN_KNOWLEDGE, HashSet::new()));

    for cap_id in required {
        let name = capabilities
            .iter()
            .find(|c| c.id == *cap_id)
            .map(|c| c.name.as_str())
            .unwrap_or("");
        let domain = classify_domain(name);
        if let Some((_, set)) = buckets.iter_mut().find(|(d, _)| *d == domain) {
            set.insert(*cap_id);
        }
    }
    buckets.into_iter().filter(|(_, caps)| !caps.is_empty()).collect()
}

/// Greedy set cover: repeatedly pick the agent whose intersection with the
/// still-uncovered required capabilities is largest (ties broken by higher
/// `performanceRating`, then by earlier position in `candidates`), until
/// every required capability is covered or no candidate agent remains.
pub fn greedy_set_cover(required: &HashSet<CapabilityId>, candidates: &[Agent]) -> Vec<AgentId> {
    let mut uncovered: HashSet<CapabilityId> = required.clone();
    let mut selected = Vec::new();
    let mut remaining: Vec<&Agent> = candidates.iter().collect();

    while !uncovered.is_empty() {
        let best = remaining
            .iter()
            .enumerate()
            .max_by(|(idx_a, a), (idx_b, b)| {
                let score_a = a.capabilities.intersection(&uncovered).count();
                let score_b = b.capabilities.intersection(&uncovered).count();
                score_a
                    .cmp(&score_b)
                    .then(a.performance_rating.total_cmp(&b.performance_rating))
                    .then(idx_b.cmp(idx_a))
            })
            .map(|(idx, agent)| (idx, agent.capabilities.intersection(&uncovered).count()));

        match best {
            Some((idx, count)) if count > 0 => {
                let agent = remaining.remove(idx);
                uncovered = uncovered.difference(&agent.capabilities).copied().collect();
                selected.push(agent.id);
            }
            _ => break,
        }
    }
    selected
}

/// A role candidate built for the diversity strategy before agents are
/// fitted to it.
#[derive(Debug, Clone)]
pub struct DiversityRole {
    pub role: Role,
}

/// Build the diversity role set: a mandatory Team Coordinator, one
/// specialist role per non-empty domain bucket, and — only if some
/// required capability wasn't claimed by any bucket — a Generalist role
/// covering the remainder.
pub fn build_role_set(
    required: &HashSet<CapabilityId>,
    capabilities: &[Capability],
    coordination_caps: &HashSet<CapabilityId>,
) -> Vec<Role> {
    let mut roles = Vec::new();

    let coordinator = Role::new("Team Coordinator", 3).with_required_capabilities(coordination_caps.iter().copied());
    roles.push(coordinator);

    let buckets = partition_by_domain(required, capabilities);
    let mut claimed: HashSet<CapabilityId> = HashSet::new();
    for (domain, caps) in &buckets {
        claimed.extend(caps.iter().copied());
        let role = Role::new(format!("{domain} Specialist"), 2)
            .with_required_capabilities(caps.iter().copied())
            .with_categories([domain.to_string()]);
        roles.push(role);
    }

    let uncovered: HashSet<CapabilityId> = required.difference(&claimed).copied().collect();
    if !uncovered.is_empty() {
        roles.push(Role::new("Generalist", 1).with_required_capabilities(uncovered));
    }

    roles
}

/// Fit `selected` agents to `roles` by highest `specMatch + capMatch`,
/// processing roles in descending priority order and assigning each role
/// the best still-unassigned selected agent. Returns `(role_index, agent)`
/// pairs for roles that could be filled from the selected pool.
pub fn fit_agents_to_roles<'a>(roles: &[Role], selected: &'a [Agent]) -> Vec<(usize, &'a Agent)> {
    let mut order: Vec<usize> = (0..roles.len()).collect();
    order.sort_by(|&a, &b| roles[b].priority.cmp(&roles[a].priority));

    let mut available: Vec<&Agent> = selected.iter().collect();
    let mut assignments = Vec::new();

    for role_idx in order {
        if available.is_empty() {
            continue;
        }
        let role = &roles[role_idx];
        let best = available
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                let score_a = spec_match(a, role) + a.capability_match(&role.required_capabilities);
                let score_b = spec_match(b, role) + b.capability_match(&role.required_capabilities);
                score_a.total_cmp(&score_b)
            })
            .map(|(idx, _)| idx);
        if let Some(idx) = best {
            let agent = available.remove(idx);
            assignments.push((role_idx, agent));
        }
    }
    assignments
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn classify_domain_matches_keywords_case_insensitively() {
        assert_eq!(classify_domain("Logical Reasoning"), "Reasoning");
        assert_eq!(classify_domain("RECALL buffer"), "Memory");
        assert_eq!(classify_domain("detect anomalies"), "Perception");
        assert_eq!(classify_domain("natural language"), "Communication");
        assert_eq!(classify_domain("database design"), DOMAIN_KNOWLEDGE);
    }

    #[test]
    fn greedy_set_cover_picks_minimal_agents() {
        let cap1 = Uuid::new_v4();
        let cap2 = Uuid::new_v4();
        let cap3 = Uuid::new_v4();
        let cap4 = Uuid::new_v4();
        let required: HashSet<_> = [cap1, cap2, cap3, cap4].into_iter().collect();

        let a1 = Agent::new("A1", "x").with_capabilities([cap1, cap2]);
        let a2 = Agent::new("A2", "x").with_capabilities([cap3, cap4]);
        let a3 = Agent::new("A3", "x").with_capabilities([cap1, cap3]);

        let selected = greedy_set_cover(&required, &[a1.clone(), a2.clone(), a3.clone()]);
        let selected_set: HashSet<_> = selected.into_iter().collect();
        assert_eq!(selected_set, [a1.id, a2.id].into_iter().collect());
    }
}
