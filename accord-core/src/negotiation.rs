//! Negotiation domain model
//!
//! Engine logic (round advancement, conflict resolution, timeout handling)
//! lives in the `accord-negotiation` crate. This module carries the data
//! shapes plus the "current proposal" bookkeeping the negotiation state
//! machine needs on every turn.

use crate::ids::{AgentId, MessageId, NegotiationId, TaskId};
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Lifecycle status of a Negotiation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NegotiationStatus {
    Initiated,
    InProgress,
    Successful,
    Failed,
    Timeout,
}

/// Strategy used to resolve conflicting proposals once a round closes
/// without unanimous acceptance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConflictResolutionStrategy {
    PriorityBased,
    Compromise,
    Voting,
    Optimization,
}

/// A resource-key -> amount proposal. Uses `BTreeMap` so two proposals with
/// the same content compare and serialize identically regardless of
/// insertion order.
pub type Proposal = BTreeMap<String, Value>;

/// The kind of message exchanged within a negotiation round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MessageType {
    Proposal,
    CounterProposal,
    Accept,
    Reject,
    /// Emitted by `SYSTEM` when `resolve*` runs; never sent by a participant.
    Resolution,
}

/// A single message in a negotiation's transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NegotiationMessage {
    pub id: MessageId,
    pub negotiation_id: NegotiationId,
    pub from_agent: AgentId,
    pub message_type: MessageType,
    pub proposal: Option<Proposal>,
    pub round: u32,
    pub timestamp: DateTime<Utc>,
}

impl NegotiationMessage {
    pub fn new(
        negotiation_id: NegotiationId,
        from_agent: AgentId,
        message_type: MessageType,
        proposal: Option<Proposal>,
        round: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            negotiation_id,
            from_agent,
            message_type,
            proposal,
            round,
            timestamp: Utc::now(),
        }
    }
}

/// A negotiation among agents over a shared resource or task assignment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Negotiation {
    pub id: NegotiationId,
    pub task: Option<TaskId>,
    pub participants: Vec<AgentId>,
    pub status: NegotiationStatus,
    pub round: u32,
    pub max_rounds: u32,
    pub conflict_resolution: ConflictResolutionStrategy,
    pub messages: Vec<NegotiationMessage>,
    /// The proposal ACCEPT is evaluated against: the most recent
    /// PROPOSAL/COUNTER_PROPOSAL message, tracked explicitly rather than
    /// inferred by scanning history, since multiple proposals can be live
    /// across participants within a round.
    pub current_proposal_ref: Option<(AgentId, MessageId)>,
    pub accepted_by: Vec<AgentId>,
    pub final_agreement: Option<Proposal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
}

impl Negotiation {
    pub fn new(
        task: Option<TaskId>,
        participants: Vec<AgentId>,
        max_rounds: u32,
        conflict_resolution: ConflictResolutionStrategy,
        deadline: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            task,
            participants,
            status: NegotiationStatus::Initiated,
            round: 0,
            max_rounds,
            conflict_resolution,
            messages: Vec::new(),
            current_proposal_ref: None,
            accepted_by: Vec::new(),
            final_agreement: None,
            created_at: now,
            updated_at: now,
            deadline,
        }
    }

    /// Record `message`, updating `current_proposal_ref` when it carries a
    /// new proposal and clearing accrued acceptances (a new proposal resets
    /// who has agreed to it).
    pub fn record_message(&mut self, message: NegotiationMessage) {
        if matches!(
            message.message_type,
            MessageType::Proposal | MessageType::CounterProposal
        ) {
            self.current_proposal_ref = Some((message.from_agent, message.id));
            self.accepted_by.clear();
        }
        self.updated_at = message.timestamp;
        self.messages.push(message);
    }

    pub fn record_acceptance(&mut self, agent_id: AgentId) {
        if !self.accepted_by.contains(&agent_id) {
            self.accepted_by.push(agent_id);
        }
        self.updated_at = Utc::now();
    }

    pub fn all_participants_accepted(&self) -> bool {
        !self.participants.is_empty()
            && self
                .participants
                .iter()
                .all(|p| self.accepted_by.contains(p))
    }

    pub fn current_proposal(&self) -> Option<&Proposal> {
        let (_, message_id) = self.current_proposal_ref?;
        self.messages
            .iter()
            .find(|m| m.id == message_id)
            .and_then(|m| m.proposal.as_ref())
    }

    pub fn advance_round(&mut self) {
        self.round += 1;
        self.status = NegotiationStatus::InProgress;
        self.updated_at = Utc::now();
    }

    pub fn rounds_exhausted(&self) -> bool {
        self.round >= self.max_rounds
    }

    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map(|d| now >= d).unwrap_or(false)
    }

    pub fn conclude(&mut self, status: NegotiationStatus, agreement: Option<Proposal>) {
        self.status = status;
        self.final_agreement = agreement;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_new_proposal_resets_acceptances() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut negotiation = Negotiation::new(
            None,
            vec![a, b],
            5,
            ConflictResolutionStrategy::Compromise,
            None,
        );
        let msg1 = NegotiationMessage::new(
            negotiation.id,
            a,
            MessageType::Proposal,
            Some(Proposal::new()),
            1,
        );
        negotiation.record_message(msg1);
        negotiation.record_acceptance(b);
        assert!(!negotiation.all_participants_accepted());
        negotiation.record_acceptance(a);
        assert!(negotiation.all_participants_accepted());

        let msg2 = NegotiationMessage::new(
            negotiation.id,
            b,
            MessageType::CounterProposal,
            Some(Proposal::new()),
            1,
        );
        negotiation.record_message(msg2);
        assert!(negotiation.accepted_by.is_empty());
    }

    #[test]
    fn rounds_exhausted_at_max() {
        let mut negotiation = Negotiation::new(
            None,
            vec![Uuid::new_v4()],
            2,
            ConflictResolutionStrategy::Voting,
            None,
        );
        assert!(!negotiation.rounds_exhausted());
        negotiation.advance_round();
        negotiation.advance_round();
        assert!(negotiation.rounds_exhausted());
    }
}
