//! Canonical event types emitted by the voice governance contract.
//!
//! These mirror the publishers in `contracts/voice_governance/src/events.rs`.
//! The first topic names the transition; the second identifies its subject.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the governance contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A proposal was created (`created` topic).
    ProposalCreated,
    /// Proposal text or schedule changed (`updated` topic).
    ProposalUpdated,
    /// The creator withdrew an open proposal (`cancelled` topic).
    ProposalCancelled,
    /// Stake was added to a proposal (`staked` topic).
    StakeAdded,
    /// A direct or delegated vote was recorded (`voted` topic).
    VoteCast,
    /// A staged proposal reached its minimum stake (`activated` topic).
    ProposalActivated,
    /// A proposal met quorum and majority (`approved` topic).
    ProposalApproved,
    /// A payout slice was released (`paid` topic).
    PayoutSent,
    /// The last slice was paid (`passed` topic).
    ProposalPassed,
    /// A proposal failed evaluation (`rejected` topic).
    ProposalRejected,
    /// A delegation edge was set (`delegated` topic).
    Delegated,
    /// A delegation edge was removed (`undeleg` topic).
    Undelegated,
    /// A new cycle opened (`cycle` topic).
    CycleAdvanced,
    /// A voice decay pass started (`decayed` topic).
    VoiceDecayed,
    /// A scheduler task was queued, ran, parked or was cancelled (`task` topic).
    TaskLogged,
    /// A mirrored vote was skipped for a delegator (`skipped` topic).
    VoteSkipped,
    /// A redemption pool share was paid (`pool_paid` topic).
    PoolPaid,
    /// An active proposal was left for the next cycle (`held` topic).
    EvaluationHeld,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

/// What the second topic of an event identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Proposal,
    Account,
    Cycle,
    Task,
    None,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::ProposalCreated,
            "updated" => Self::ProposalUpdated,
            "cancelled" => Self::ProposalCancelled,
            "staked" => Self::StakeAdded,
            "voted" => Self::VoteCast,
            "activated" => Self::ProposalActivated,
            "approved" => Self::ProposalApproved,
            "paid" => Self::PayoutSent,
            "passed" => Self::ProposalPassed,
            "rejected" => Self::ProposalRejected,
            "delegated" => Self::Delegated,
            "undeleg" => Self::Undelegated,
            "cycle" => Self::CycleAdvanced,
            "decayed" => Self::VoiceDecayed,
            "task" => Self::TaskLogged,
            "skipped" => Self::VoteSkipped,
            "pool_paid" => Self::PoolPaid,
            "held" => Self::EvaluationHeld,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProposalCreated => "proposal_created",
            Self::ProposalUpdated => "proposal_updated",
            Self::ProposalCancelled => "proposal_cancelled",
            Self::StakeAdded => "stake_added",
            Self::VoteCast => "vote_cast",
            Self::ProposalActivated => "proposal_activated",
            Self::ProposalApproved => "proposal_approved",
            Self::PayoutSent => "payout_sent",
            Self::ProposalPassed => "proposal_passed",
            Self::ProposalRejected => "proposal_rejected",
            Self::Delegated => "delegated",
            Self::Undelegated => "undelegated",
            Self::CycleAdvanced => "cycle_advanced",
            Self::VoiceDecayed => "voice_decayed",
            Self::TaskLogged => "task_logged",
            Self::VoteSkipped => "vote_skipped",
            Self::PoolPaid => "pool_paid",
            Self::EvaluationHeld => "evaluation_held",
            Self::Unknown => "unknown",
        }
    }

    pub fn subject(&self) -> Subject {
        match self {
            Self::ProposalCreated
            | Self::ProposalUpdated
            | Self::ProposalCancelled
            | Self::StakeAdded
            | Self::VoteCast
            | Self::ProposalActivated
            | Self::ProposalApproved
            | Self::PayoutSent
            | Self::ProposalPassed
            | Self::ProposalRejected
            | Self::VoteSkipped
            | Self::EvaluationHeld => Subject::Proposal,
            Self::Delegated | Self::Undelegated | Self::PoolPaid => Subject::Account,
            Self::CycleAdvanced => Subject::Cycle,
            Self::TaskLogged => Subject::Task,
            Self::VoiceDecayed | Self::Unknown => Subject::None,
        }
    }
}

/// A fully decoded governance event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceEvent {
    /// Stable identity used to make inserts idempotent.
    pub event_id: String,
    pub event_type: String,
    /// Raw second topic (proposal id, account, cycle or task id).
    pub subject: Option<String>,
    pub proposal_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub subject: Option<String>,
    pub proposal_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}
