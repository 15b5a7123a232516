//! Conflict-resolution strategies (spec.md §4.4), run over the set of
//! proposals collected so far. All four are deterministic given the same
//! ordered proposal set.

use std::collections::HashMap;

use accord_core::{Agent, AgentId, NegotiationConfig, Proposal, Scalar, Value};
use chrono::{DateTime, Utc};

/// One agent's live proposal plus the bookkeeping resolution needs: when it
/// was posted (VOTING's tie-break) and whether it's the initiator
/// (PRIORITY_BASED's bonus).
#[derive(Debug, Clone)]
pub struct ProposalEntry {
    pub agent_id: AgentId,
    pub proposal: Proposal,
    pub timestamp: DateTime<Utc>,
}

/// `PRIORITY_BASED`: priority = round(performanceRating * 10), +5 for the
/// initiator. Ties: initiator wins, then lowest `AgentId`.
pub fn priority_based(
    entries: &[ProposalEntry],
    initiator_id: AgentId,
    agents: &HashMap<AgentId, Agent>,
) -> Option<Proposal> {
    entries
        .iter()
        .max_by(|a, b| {
            priority_of(a.agent_id, initiator_id, agents)
                .cmp(&priority_of(b.agent_id, initiator_id, agents))
                .then_with(|| is_initiator(a.agent_id, initiator_id).cmp(&is_initiator(b.agent_id, initiator_id)))
                .then_with(|| b.agent_id.cmp(&a.agent_id))
        })
        .map(|e| e.proposal.clone())
}

fn priority_of(agent_id: AgentId, initiator_id: AgentId, agents: &HashMap<AgentId, Agent>) -> i64 {
    let base = agents
        .get(&agent_id)
        .map(|a| (a.performance_rating * 10.0).round() as i64)
        .unwrap_or(0);
    if agent_id == initiator_id {
        base + 5
    } else {
        base
    }
}

fn is_initiator(agent_id: AgentId, initiator_id: AgentId) -> bool {
    agent_id == initiator_id
}

/// `COMPROMISE`: union of all keys across proposals. Numeric keys take the
/// arithmetic mean; boolean keys take strict majority (ties => false);
/// everything else takes the mode (first-seen value wins ties).
pub fn compromise(entries: &[ProposalEntry]) -> Proposal {
    let mut keys: Vec<String> = Vec::new();
    for entry in entries {
        for key in entry.proposal.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }

    let mut result = Proposal::new();
    for key in keys {
        let values: Vec<&Value> = entries.iter().filter_map(|e| e.proposal.get(&key)).collect();
        if values.is_empty() {
            continue;
        }
        result.insert(key, resolve_compromise_value(&values));
    }
    result
}

fn resolve_compromise_value(values: &[&Value]) -> Value {
    if values.iter().all(|v| matches!(v, Value::Scalar(Scalar::Number(_)))) {
        let sum: f64 = values
            .iter()
            .filter_map(|v| v.as_f64())
            .sum();
        return Value::number(sum / values.len() as f64);
    }
    if values.iter().all(|v| matches!(v, Value::Scalar(Scalar::Bool(_)))) {
        let true_count = values.iter().filter(|v| v.as_bool() == Some(true)).count();
        return Value::boolean(true_count * 2 > values.len());
    }
    mode(values)
}

/// Most-frequent value, first-seen order breaking ties.
fn mode(values: &[&Value]) -> Value {
    let (value, _) = tally(values).into_iter().max_by_key(|(_, count)| *count).expect("values is non-empty");
    value
}

/// Count occurrences of each distinct value, preserving first-seen order.
fn tally(values: &[&Value]) -> Vec<(Value, usize)> {
    let mut counts: Vec<(Value, usize)> = Vec::new();
    for value in values {
        let found = counts.iter().position(|(v, _)| v == *value);
        match found {
            Some(idx) => counts[idx].1 += 1,
            None => counts.push(((*value).clone(), 1)),
        }
    }
    counts
}

/// `VOTING`: each proposal casts one vote for itself by structural
/// equality; the most-voted proposal wins, ties broken by earliest
/// timestamp.
pub fn voting(entries: &[ProposalEntry]) -> Option<Proposal> {
    let mut groups: Vec<(Proposal, usize, DateTime<Utc>)> = Vec::new();
    for entry in entries {
        if let Some(group) = groups.iter_mut().find(|(p, _, _)| *p == entry.proposal) {
            group.1 += 1;
            if entry.timestamp < group.2 {
                group.2 = entry.timestamp;
            }
        } else {
            groups.push((entry.proposal.clone(), 1, entry.timestamp));
        }
    }
    groups
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.2.cmp(&a.2)))
        .map(|(proposal, _, _)| proposal)
}

/// `OPTIMIZATION`: per key, choose the value maximizing
/// `1 + support_count / total_proposals`. Falls back to `COMPROMISE` when
/// `resourceOptimizationEnabled` is false (checked by the caller via
/// `NegotiationConfig::effective_strategy`, not here). The per-resource
/// `maxQuantity` ceiling (the source's `getMaxQuantity`, kept configurable
/// per spec.md §9) clamps the winning numeric value, mirroring what that
/// ceiling was for in the original.
pub fn optimization(entries: &[ProposalEntry], config: &NegotiationConfig) -> Proposal {
    let mut keys: Vec<String> = Vec::new();
    for entry in entries {
        for key in entry.proposal.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }
    let total = entries.len().max(1);

    let mut result = Proposal::new();
    for key in keys {
        let values: Vec<&Value> = entries.iter().filter_map(|e| e.proposal.get(&key)).collect();
        if values.is_empty() {
            continue;
        }
        let winner = tally(&values)
            .into_iter()
            .max_by(|a, b| {
                let utility_a = 1.0 + a.1 as f64 / total as f64;
                let utility_b = 1.0 + b.1 as f64 / total as f64;
                utility_a.total_cmp(&utility_b)
            })
            .map(|(value, _)| value)
            .expect("values is non-empty");

        let clamped = match winner.as_f64() {
            Some(n) => Value::number(n.min(config.optimization.max_quantity_for(&key))),
            None => winner,
        };
        result.insert(key, clamped);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(agent: AgentId, pairs: &[(&str, Value)], ts: DateTime<Utc>) -> ProposalEntry {
        let mut proposal = Proposal::new();
        for (k, v) in pairs {
            proposal.insert(k.to_string(), v.clone());
        }
        ProposalEntry {
            agent_id: agent,
            proposal,
            timestamp: ts,
        }
    }

    /// S5 — priority-based resolution on round exhaustion.
    #[test]
    fn s5_priority_based_resolution() {
        let initiator = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let mut agents = HashMap::new();
        agents.insert(initiator, Agent::new("I", "x").with_performance_rating(8.0));
        agents.insert(p1, Agent::new("P1", "x").with_performance_rating(6.0));
        agents.insert(p2, Agent::new("P2", "x").with_performance_rating(9.0));

        let now = Utc::now();
        let entries = vec![
            entry(initiator, &[("cpu", Value::number(1.0))], now),
            entry(p1, &[("cpu", Value::number(2.0))], now),
            entry(p2, &[("cpu", Value::number(3.0))], now),
        ];

        let winner = priority_based(&entries, initiator, &agents).unwrap();
        assert_eq!(winner.get("cpu"), Some(&Value::number(3.0)));
    }

    /// S6 — COMPROMISE numeric average.
    #[test]
    fn s6_compromise_numeric_mean() {
        let now = Utc::now();
        let entries = vec![
            entry(Uuid::new_v4(), &[("cpu", Value::number(4.0))], now),
            entry(Uuid::new_v4(), &[("cpu", Value::number(6.0))], now),
            entry(Uuid::new_v4(), &[("cpu", Value::number(8.0))], now),
        ];
        let resolved = compromise(&entries);
        assert_eq!(resolved.get("cpu"), Some(&Value::number(6.0)));
    }

    #[test]
    fn compromise_boolean_majority_ties_to_false() {
        let now = Utc::now();
        let entries = vec![
            entry(Uuid::new_v4(), &[("ok", Value::boolean(true))], now),
            entry(Uuid::new_v4(), &[("ok", Value::boolean(false))], now),
        ];
        let resolved = compromise(&entries);
        assert_eq!(resolved.get("ok"), Some(&Value::boolean(false)));
    }

    #[test]
    fn voting_breaks_ties_on_earliest_timestamp() {
        let now = Utc::now();
        let later = now + chrono::Duration::seconds(5);
        let mut proposal_a = Proposal::new();
        proposal_a.insert("x".to_string(), Value::number(1.0));
        let mut proposal_b = Proposal::new();
        proposal_b.insert("x".to_string(), Value::number(2.0));

        let entries = vec![
            ProposalEntry {
                agent_id: Uuid::new_v4(),
                proposal: proposal_a.clone(),
                timestamp: later,
            },
            ProposalEntry {
                agent_id: Uuid::new_v4(),
                proposal: proposal_b,
                timestamp: now,
            },
        ];
        let winner = voting(&entries).unwrap();
        // one vote each; earliest timestamp (proposal_b, posted at `now`) wins
        assert_eq!(winner.get("x"), Some(&Value::number(2.0)));
    }
}
