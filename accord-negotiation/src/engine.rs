//! The Negotiation Engine (C4): drives the round-based protocol described
//! in spec.md §4.4 — initiate, respond, resolve on round exhaustion or
//! timeout, analyze a concluded negotiation.

use std::collections::HashMap;
use std::sync::Arc;

use accord_core::{
    AgentId, ConflictResolutionStrategy, MessageType, Negotiation, NegotiationConfig,
    NegotiationId, NegotiationMessage, NegotiationStatus, Proposal, SharedClock, TaskId, Value,
};
use accord_storage::{AgentRepository, NegotiationRepository};
use accord_context::ContextEngine;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::resolution::{compromise, optimization, priority_based, voting, ProposalEntry};

/// The message a `SYSTEM`-sent `RESOLUTION` carries; there is no live agent
/// behind it, so it's not routed through `AgentRepository`.
const SYSTEM_SENDER: AgentId = Uuid::nil();

/// Histogram-style report returned by `Analyze`.
#[derive(Debug, Clone)]
pub struct NegotiationReport {
    pub duration_ms: i64,
    pub rounds_reached: u32,
    pub participant_count: usize,
    pub messages_by_type: HashMap<String, usize>,
    pub messages_by_sender: HashMap<AgentId, usize>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

/// Optional settings for `Initiate`, overriding `NegotiationConfig`
/// defaults for a single negotiation.
#[derive(Debug, Clone, Default)]
pub struct InitiateOptions {
    pub max_rounds: Option<u32>,
    pub timeout: Option<chrono::Duration>,
    pub strategy: Option<ConflictResolutionStrategy>,
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
}

/// Where to write a successful negotiation's final agreement, per the
/// §4.5 cross-component hook. The hook is skipped silently (not an error)
/// if the context is missing or the initiator lacks UPDATE permission.
#[derive(Debug, Clone)]
pub struct ContextSink {
    pub context_id: accord_core::ContextId,
    pub path: String,
}

#[derive(Clone)]
pub struct NegotiationEngine {
    negotiations: NegotiationRepository,
    agents: AgentRepository,
    config: NegotiationConfig,
    clock: SharedClock,
    context_engine: Option<Arc<ContextEngine>>,
}

impl NegotiationEngine {
    pub fn new(
        negotiations: NegotiationRepository,
        agents: AgentRepository,
        config: NegotiationConfig,
        clock: SharedClock,
        context_engine: Option<Arc<ContextEngine>>,
    ) -> Self {
        Self {
            negotiations,
            agents,
            config,
            clock,
            context_engine,
        }
    }

    pub fn get_negotiation(&self, negotiation_id: NegotiationId) -> Result<Negotiation> {
        self.negotiations.get(negotiation_id)
    }

    /// `Initiate(initiatorId, participantIds, subject, resources,
    /// initialProposal, {maxRounds, timeout, strategy})`.
    ///
    /// `subject`/`resources` are carried by the caller's task association
    /// rather than stored fields of `Negotiation` (the domain model ties a
    /// negotiation to at most one `Task`, per accord-core's `Negotiation`);
    /// pass `task` when this negotiation is about a specific task.
    pub fn initiate(
        &self,
        initiator_id: AgentId,
        participant_ids: Vec<AgentId>,
        task: Option<TaskId>,
        initial_proposal: Proposal,
        options: InitiateOptions,
    ) -> Result<Negotiation> {
        self.agents
            .get(initiator_id)
            .map_err(|_| Error::not_found("Agent", initiator_id.to_string()))?;
        for participant_id in &participant_ids {
            self.agents
                .get(*participant_id)
                .map_err(|_| Error::not_found("Agent", participant_id.to_string()))?;
        }

        let mut participants = participant_ids;
        if !participants.contains(&initiator_id) {
            participants.push(initiator_id);
        }

        let max_rounds = options.max_rounds.unwrap_or(self.config.max_rounds);
        let strategy = options.strategy.unwrap_or(self.config.default_strategy);
        let timeout = options
            .timeout
            .unwrap_or_else(|| chrono::Duration::from_std(self.config.timeout).unwrap_or(chrono::Duration::seconds(15)));
        let deadline = options.deadline.or_else(|| Some(self.clock.now() + timeout));

        let mut negotiation = Negotiation::new(task, participants, max_rounds, strategy, deadline);
        negotiation.round = 1;

        let message = NegotiationMessage::new(
            negotiation.id,
            initiator_id,
            MessageType::Proposal,
            Some(initial_proposal),
            negotiation.round,
        );
        negotiation.record_message(message);

        self.negotiations.save(negotiation.clone())?;
        info!(negotiation_id = %negotiation.id, initiator_id = %initiator_id, "negotiation initiated");
        Ok(negotiation)
    }

    /// `Respond(negotiationId, agentId, type, content)`.
    pub async fn respond(
        &self,
        negotiation_id: NegotiationId,
        agent_id: AgentId,
        message_type: MessageType,
        content: Option<Proposal>,
    ) -> Result<Negotiation> {
        if !matches!(
            message_type,
            MessageType::CounterProposal | MessageType::Accept | MessageType::Reject
        ) {
            return Err(Error::invalid_argument(
                "Respond only accepts COUNTER_PROPOSAL, ACCEPT, or REJECT",
            ));
        }

        let mut negotiation = self.negotiations.get(negotiation_id)?;

        if !negotiation.participants.contains(&agent_id) {
            return Err(Error::permission_denied(format!(
                "agent {agent_id} is not a participant in negotiation {negotiation_id}"
            )));
        }
        if !matches!(
            negotiation.status,
            NegotiationStatus::Initiated | NegotiationStatus::InProgress
        ) {
            return Err(Error::invalid_state(format!(
                "negotiation {negotiation_id} is already closed"
            )));
        }

        if negotiation.status == NegotiationStatus::Initiated {
            negotiation.status = NegotiationStatus::InProgress;
        }

        let now = self.clock.now();
        let message = NegotiationMessage::new(negotiation_id, agent_id, message_type, content.clone(), negotiation.round);
        negotiation.record_message(message);

        match message_type {
            MessageType::CounterProposal => {
                let responders_this_round = self.responders_in_round(&negotiation, negotiation.round);
                if negotiation
                    .participants
                    .iter()
                    .all(|p| responders_this_round.contains(p))
                {
                    negotiation.advance_round();
                    if negotiation.round > negotiation.max_rounds {
                        self.resolve(&mut negotiation).await?;
                    }
                }
            }
            MessageType::Accept => {
                negotiation.record_acceptance(agent_id);
                if negotiation.all_participants_accepted() {
                    let agreement = negotiation.current_proposal().cloned();
                    negotiation.conclude(NegotiationStatus::Successful, agreement);
                }
            }
            MessageType::Reject => {
                if negotiation.rounds_exhausted() {
                    negotiation.conclude(NegotiationStatus::Failed, None);
                }
            }
            _ => unreachable!(),
        }

        if matches!(
            negotiation.status,
            NegotiationStatus::Initiated | NegotiationStatus::InProgress
        ) && negotiation.is_past_deadline(now)
        {
            negotiation.status = NegotiationStatus::Timeout;
            self.resolve(&mut negotiation).await?;
        }

        self.negotiations.save(negotiation.clone())?;
        Ok(negotiation)
    }

    /// Agents who have posted a PROPOSAL or COUNTER_PROPOSAL in `round`.
    fn responders_in_round(&self, negotiation: &Negotiation, round: u32) -> Vec<AgentId> {
        let mut out = Vec::new();
        for message in &negotiation.messages {
            if message.round == round
                && matches!(message.message_type, MessageType::Proposal | MessageType::CounterProposal)
                && !out.contains(&message.from_agent)
            {
                out.push(message.from_agent);
            }
        }
        out
    }

    /// `resolve*`: runs the configured strategy over proposals collected so
    /// far, emits a `RESOLUTION` message from `SYSTEM_SENDER` carrying the
    /// agreement, sets `finalAgreement`, and transitions to SUCCESSFUL, or
    /// FAILED if no proposals exist.
    async fn resolve(&self, negotiation: &mut Negotiation) -> Result<()> {
        let entries = self.latest_proposal_per_participant(negotiation);
        if entries.is_empty() {
            negotiation.conclude(NegotiationStatus::Failed, None);
            warn!(negotiation_id = %negotiation.id, "resolution found no proposals; negotiation failed");
            return Ok(());
        }

        let strategy = self.config.effective_strategy(negotiation.conflict_resolution);
        let agents: HashMap<AgentId, accord_core::Agent> = negotiation
            .participants
            .iter()
            .filter_map(|id| self.agents.get(*id).ok().map(|a| (*id, a)))
            .collect();

        let initiator_id = negotiation.participants.first().copied().unwrap_or(SYSTEM_SENDER);
        let agreement = match strategy {
            ConflictResolutionStrategy::PriorityBased => priority_based(&entries, initiator_id, &agents),
            ConflictResolutionStrategy::Compromise => Some(compromise(&entries)),
            ConflictResolutionStrategy::Voting => voting(&entries),
            ConflictResolutionStrategy::Optimization => Some(optimization(&entries, &self.config)),
        };

        match agreement {
            Some(agreement) => {
                let resolution_message = NegotiationMessage::new(
                    negotiation.id,
                    SYSTEM_SENDER,
                    MessageType::Resolution,
                    Some(agreement.clone()),
                    negotiation.round,
                );
                negotiation.messages.push(resolution_message);
                negotiation.conclude(NegotiationStatus::Successful, Some(agreement));
                info!(negotiation_id = %negotiation.id, strategy = ?strategy, "negotiation resolved");
            }
            None => {
                negotiation.conclude(NegotiationStatus::Failed, None);
            }
        }
        Ok(())
    }

    /// §4.5 cross-component hook: mirrors a successful negotiation's final
    /// agreement into a Context path. Callers invoke this after `respond`
    /// returns a `SUCCESSFUL` negotiation; skipped silently (not an error)
    /// when no context engine is wired, the negotiation has no agreement
    /// yet, the context is missing, or the initiator lacks UPDATE access.
    pub async fn write_agreement_to_context(
        &self,
        negotiation_id: NegotiationId,
        initiator_id: AgentId,
        sink: &ContextSink,
    ) -> Result<()> {
        let Some(context_engine) = &self.context_engine else {
            return Ok(());
        };
        let negotiation = self.negotiations.get(negotiation_id)?;
        let Some(agreement) = negotiation.final_agreement.clone() else {
            return Ok(());
        };

        let tree = Value::Tree(agreement.into_iter().collect());
        match context_engine
            .update_context(sink.context_id, initiator_id, vec![(sink.path.clone(), tree)], HashMap::new())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_permission_denied() || e.is_not_found() => Ok(()),
            Err(other) => Err(other.into()),
        }
    }

    /// The most recent proposal or counter-proposal posted by each
    /// participant, in participant order — the input `resolve*` strategies
    /// operate over.
    fn latest_proposal_per_participant(&self, negotiation: &Negotiation) -> Vec<ProposalEntry> {
        let mut entries = Vec::new();
        for participant_id in &negotiation.participants {
            let latest = negotiation
                .messages
                .iter()
                .rev()
                .find(|m| {
                    m.from_agent == *participant_id
                        && matches!(m.message_type, MessageType::Proposal | MessageType::CounterProposal)
                });
            if let Some(message) = latest {
                if let Some(proposal) = &message.proposal {
                    entries.push(ProposalEntry {
                        agent_id: *participant_id,
                        proposal: proposal.clone(),
                        timestamp: message.timestamp,
                    });
                }
            }
        }
        entries
    }

    /// `Analyze(negotiationId)`. `InvalidState` on an active negotiation.
    pub fn analyze(&self, negotiation_id: NegotiationId) -> Result<NegotiationReport> {
        let negotiation = self.negotiations.get(negotiation_id)?;
        if matches!(
            negotiation.status,
            NegotiationStatus::Initiated | NegotiationStatus::InProgress
        ) {
            return Err(Error::invalid_state(format!(
                "negotiation {negotiation_id} is still active"
            )));
        }

        let duration_ms = (negotiation.updated_at - negotiation.created_at).num_milliseconds();

        let mut messages_by_type: HashMap<String, usize> = HashMap::new();
        let mut messages_by_sender: HashMap<AgentId, usize> = HashMap::new();
        for message in &negotiation.messages {
            *messages_by_type.entry(message_type_tag(message.message_type).to_string()).or_insert(0) += 1;
            *messages_by_sender.entry(message.from_agent).or_insert(0) += 1;
        }

        let (added, removed, modified) = if negotiation.status == NegotiationStatus::Successful {
            self.diff_initial_final(&negotiation)
        } else {
            (Vec::new(), Vec::new(), Vec::new())
        };

        Ok(NegotiationReport {
            duration_ms,
            rounds_reached: negotiation.round,
            participant_count: negotiation.participants.len(),
            messages_by_type,
            messages_by_sender,
            added,
            removed,
            modified,
        })
    }

    fn diff_initial_final(&self, negotiation: &Negotiation) -> (Vec<String>, Vec<String>, Vec<String>) {
        let initial = negotiation
            .messages
            .iter()
            .find(|m| matches!(m.message_type, MessageType::Proposal))
            .and_then(|m| m.proposal.clone())
            .unwrap_or_default();
        let Some(final_agreement) = negotiation.final_agreement.clone() else {
            return (Vec::new(), Vec::new(), Vec::new());
        };

        let mut added = Vec::new();
        let mut removed = Vec::new();
        let mut modified = Vec::new();
        for (key, value) in &final_agreement {
            match initial.get(key) {
                None => added.push(key.clone()),
                Some(old) if old != value => modified.push(key.clone()),
                _ => {}
            }
        }
        for key in initial.keys() {
            if !final_agreement.contains_key(key) {
                removed.push(key.clone());
            }
        }
        (added, removed, modified)
    }
}

fn message_type_tag(message_type: MessageType) -> &'static str {
    match message_type {
        MessageType::Proposal => "PROPOSAL",
        MessageType::CounterProposal => "COUNTER_PROPOSAL",
        MessageType::Accept => "ACCEPT",
        MessageType::Reject => "REJECT",
        MessageType::Resolution => "RESOLUTION",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::{Agent, SystemClock};
    use accord_storage::AgentRepository;

    fn engine() -> (NegotiationEngine, AgentRepository, NegotiationRepository) {
        let agents = AgentRepository::new();
        let negotiations = NegotiationRepository::new();
        let engine = NegotiationEngine::new(
            negotiations.clone(),
            agents.clone(),
            NegotiationConfig::default(),
            Arc::new(SystemClock),
            None,
        );
        (engine, agents, negotiations)
    }

    fn proposal(pairs: &[(&str, Value)]) -> Proposal {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    /// S7 — unanimous accept: `finalAgreement == P`, `status == SUCCESSFUL`,
    /// no system resolution message emitted.
    #[tokio::test]
    async fn s7_unanimous_accept() {
        let (engine, agents, _) = engine();
        let initiator = Agent::new("I", "x");
        let p1 = Agent::new("P1", "x");
        let p2 = Agent::new("P2", "x");
        let (initiator_id, p1_id, p2_id) = (initiator.id, p1.id, p2.id);
        agents.save(initiator).unwrap();
        agents.save(p1).unwrap();
        agents.save(p2).unwrap();

        let p = proposal(&[("mem", Value::number(16.0))]);
        let negotiation = engine
            .initiate(initiator_id, vec![p1_id, p2_id], None, p.clone(), InitiateOptions::default())
            .unwrap();

        let message_count_before = negotiation.messages.len();
        engine.respond(negotiation.id, p1_id, MessageType::Accept, None).await.unwrap();
        let negotiation = engine.respond(negotiation.id, p2_id, MessageType::Accept, None).await.unwrap();
        let final_before_initiator = negotiation.status;

        // Initiator itself must also accept for unanimity (it's a participant).
        let negotiation = if final_before_initiator != NegotiationStatus::Successful {
            engine.respond(negotiation.id, initiator_id, MessageType::Accept, None).await.unwrap()
        } else {
            negotiation
        };

        assert_eq!(negotiation.status, NegotiationStatus::Successful);
        assert_eq!(negotiation.final_agreement, Some(p));
        // no SYSTEM resolution message: total messages = initial proposal + 3 accepts
        assert_eq!(negotiation.messages.len(), message_count_before + 3);
    }

    /// S5 — PRIORITY_BASED resolution once rounds are exhausted.
    #[tokio::test]
    async fn s5_priority_based_on_round_exhaustion() {
        let (engine, agents, _) = engine();
        let initiator = Agent::new("I", "x").with_performance_rating(8.0);
        let p1 = Agent::new("P1", "x").with_performance_rating(6.0);
        let p2 = Agent::new("P2", "x").with_performance_rating(9.0);
        let (initiator_id, p1_id, p2_id) = (initiator.id, p1.id, p2.id);
        agents.save(initiator).unwrap();
        agents.save(p1).unwrap();
        agents.save(p2).unwrap();

        let options = InitiateOptions {
            max_rounds: Some(2),
            strategy: Some(ConflictResolutionStrategy::PriorityBased),
            ..Default::default()
        };
        let negotiation = engine
            .initiate(
                initiator_id,
                vec![p1_id, p2_id],
                None,
                proposal(&[("cpu", Value::number(1.0))]),
                options,
            )
            .unwrap();

        // Round 1: the other two counter-propose to close out round 1.
        engine
            .respond(negotiation.id, p1_id, MessageType::CounterProposal, Some(proposal(&[("cpu", Value::number(2.0))])))
            .await
            .unwrap();
        let negotiation = engine
            .respond(negotiation.id, p2_id, MessageType::CounterProposal, Some(proposal(&[("cpu", Value::number(3.0))])))
            .await
            .unwrap();
        assert_eq!(negotiation.round, 2);

        // Round 2: everyone posts a distinct counter-proposal, exhausting rounds.
        engine
            .respond(negotiation.id, initiator_id, MessageType::CounterProposal, Some(proposal(&[("cpu", Value::number(4.0))])))
            .await
            .unwrap();
        engine
            .respond(negotiation.id, p1_id, MessageType::CounterProposal, Some(proposal(&[("cpu", Value::number(5.0))])))
            .await
            .unwrap();
        let negotiation = engine
            .respond(negotiation.id, p2_id, MessageType::CounterProposal, Some(proposal(&[("cpu", Value::number(6.0))])))
            .await
            .unwrap();

        assert_eq!(negotiation.status, NegotiationStatus::Successful);
        assert_eq!(negotiation.final_agreement, Some(proposal(&[("cpu", Value::number(6.0))])));
    }
}
