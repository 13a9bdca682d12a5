//! # Types
//!
//! Shared data structures used across all modules of the governance contract.
//!
//! ## Terms / State split
//!
//! A proposal is stored as two separate ledger entries:
//!
//! - [`ProposalTerms`]: written at creation and rewritten only by
//!   `update_proposal` while the proposal has no votes.
//! - [`ProposalState`]: written on every stake, vote and evaluation.
//!
//! The public API exposes the reconstructed [`Proposal`] struct.
//!
//! ## Two orthogonal state machines
//!
//! ```text
//! stage:   Staged ──► Active ──► Done
//!
//! status:  Open ──► Evaluate ──► Passed
//!            │          │
//!            └──────────┴──► Rejected
//! ```
//!
//! `status` only moves during an evaluation pass; `stage` never moves back.

use soroban_sdk::{contracttype, Address, String, Vec};

/// Coarse lifecycle phase of a proposal.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    /// Collecting stake; not yet open for votes.
    Staged,
    /// Stake threshold met; open for votes and evaluated every cycle.
    Active,
    /// Terminal.
    Done,
}

/// Outcome phase of a proposal.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// Waiting for its first successful evaluation.
    Open,
    /// Approved once; paying out the schedule, one slice per cycle.
    Evaluate,
    /// Schedule exhausted.
    Passed,
    /// Failed majority or quorum.
    Rejected,
}

/// Fund pool a proposal draws from.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fund {
    Campaigns,
    Milestone,
    Alliance,
}

/// Coarse classification of a fund.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FundType {
    Campaign,
    Milestone,
    Alliance,
}

/// Voice scope. Alliance proposals are voted with alliance voice, everything
/// else with general voice.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoiceScope {
    General,
    Alliance,
}

impl Fund {
    pub fn fund_type(self) -> FundType {
        match self {
            Fund::Campaigns => FundType::Campaign,
            Fund::Milestone => FundType::Milestone,
            Fund::Alliance => FundType::Alliance,
        }
    }
}

impl FundType {
    /// Milestone proposals share the campaign voice scope and payout path.
    pub fn scope(self) -> VoiceScope {
        match self {
            FundType::Alliance => VoiceScope::Alliance,
            FundType::Campaign | FundType::Milestone => VoiceScope::General,
        }
    }
}

/// Campaign sub-type.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CampaignKind {
    Ordinary,
    Invite,
}

/// Extra terms carried by invite-campaign proposals.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InviteTerms {
    pub max_amount_per_invite: i128,
    pub planted: i128,
    pub reward: i128,
}

/// Free-text fields of a proposal.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalText {
    pub title: String,
    pub summary: String,
    pub description: String,
    pub image: String,
    pub url: String,
}

/// Proposal terms, fixed once voting starts.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalTerms {
    pub id: u64,
    pub creator: Address,
    pub recipient: Address,
    pub quantity: i128,
    pub fund: Fund,
    pub campaign: CampaignKind,
    pub invite: Option<InviteTerms>,
    pub created_at: u64,
    pub text: ProposalText,
    /// Payout percentages, one per cycle.
    pub schedule: Vec<u32>,
}

/// Mutable proposal state.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalState {
    pub staked: i128,
    pub current_payout: i128,
    pub favour: u64,
    pub against: u64,
    pub total: u64,
    pub status: Status,
    pub stage: Stage,
    pub age: u32,
    pub passed_cycle: u32,
    pub executed: bool,
    pub campaign_id: u64,
}

/// Full proposal as returned by the public API.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Proposal {
    pub id: u64,
    pub creator: Address,
    pub recipient: Address,
    pub quantity: i128,
    pub fund: Fund,
    pub campaign: CampaignKind,
    pub invite: Option<InviteTerms>,
    pub created_at: u64,
    pub text: ProposalText,
    pub schedule: Vec<u32>,
    pub staked: i128,
    pub current_payout: i128,
    pub favour: u64,
    pub against: u64,
    pub total: u64,
    pub status: Status,
    pub stage: Stage,
    pub age: u32,
    pub passed_cycle: u32,
    pub executed: bool,
    pub campaign_id: u64,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoteOption {
    Trust,
    Distrust,
    Abstain,
}

/// A single ballot, keyed by (proposal, voter).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Vote {
    pub proposal_id: u64,
    pub voter: Address,
    pub amount: u64,
    pub favour: bool,
    pub option: VoteOption,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Delegation {
    pub delegator: Address,
    pub delegatee: Address,
    /// Basis points; always 10 000.
    pub weight_bps: u32,
    pub timestamp: u64,
}

/// Per-account participation in one cycle, consumed by that cycle's reward sweep.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Participant {
    pub count: u32,
    pub non_neutral: bool,
}

/// Membership status reported by the membership registry.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemberStatus {
    Visitor,
    Resident,
    Citizen,
}

/// Cycle controller context.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CycleState {
    pub cycle: u32,
    /// Timestamp of the last `on_period`.
    pub last_period: u64,
    /// Timestamp of the last decay sweep trigger.
    pub last_decay: u64,
}

/// Statistics frozen per cycle.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CycleStats {
    pub cycle: u32,
    pub start_time: u64,
    pub end_time: u64,
    pub num_proposals: u32,
    pub num_votes: u32,
    pub total_voice_cast: u64,
    pub total_favour: u64,
    pub total_against: u64,
    pub total_citizens: u64,
    pub total_eligible_voters: u64,
    pub quorum_vote_base: u64,
    pub quorum_votes_needed: u64,
    pub unity_needed_pct: u32,
    pub active_props: Vec<u64>,
    pub eval_props: Vec<u64>,
}

/// Minimum-stake and cap rule for one fund.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakeRule {
    /// Share of the requested quantity, in basis points.
    pub pct_bps: u32,
    pub min: i128,
    pub max: i128,
    /// Upper bound on total stake.
    pub cap: i128,
}

/// Numeric governance parameters.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GovernanceConfig {
    pub batch_size: u32,
    pub majority_pct: u32,
    pub quorum_base: u32,
    pub quorum_min_pct: u32,
    pub quorum_max_pct: u32,
    pub quorum_base_cycles: u32,
    pub cycle_secs: u64,
    pub inactive_cycles: u32,
    pub decay_pct: u32,
    pub decay_grace_secs: u64,
    pub decay_period_secs: u64,
    pub max_delegation_depth: u32,
    pub vote_rep: u32,
    pub participation_rep: u32,
    pub delegated_rep_pct: u32,
    pub pass_rep: u32,
    pub reject_penalty: u32,
    pub invite_min_planted: i128,
    pub invite_max_reward: i128,
    pub continuation_delay_secs: u64,
    pub campaign_stake: StakeRule,
    pub milestone_stake: StakeRule,
    pub alliance_stake: StakeRule,
}

/// Addresses of the contracts this one talks to.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Collaborators {
    pub token: Address,
    pub membership: Address,
    pub reputation: Address,
    pub rank_source: Address,
    pub escrow: Address,
    pub escrow_arbiter: Address,
    pub campaigns: Address,
    pub milestone_recipient: Address,
}

// ── Continuations ────────────────────────────────────────────────────

/// Which proposal index an evaluation sweep is walking.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SweepPhase {
    Active,
    Staged,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EvalSweep {
    /// Cycle whose statistics the evaluation reads.
    pub cycle: u32,
    pub phase: SweepPhase,
    /// Next stage-index slot to look at in the current phase.
    pub cursor: u64,
    /// Active-index slots at or above this were filled after the cycle closed.
    pub active_upto: u64,
    /// Same bound for the staged index.
    pub staged_upto: u64,
    pub chunk: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoiceSweep {
    /// Next roster slot.
    pub cursor: u64,
    pub chunk: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MimicVote {
    pub delegatee: Address,
    pub scope: VoiceScope,
    pub proposal_id: u64,
    pub option: VoteOption,
    /// Voice the delegatee spent.
    pub spent: u64,
    /// Delegatee balance before the vote.
    pub basis: u64,
    /// Next slot of the delegatee's delegator roster.
    pub cursor: u64,
    pub chunk: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardSweep {
    /// Cycle whose participation is rewarded.
    pub cycle: u32,
    pub active_proposals: u64,
    pub cursor: u64,
    pub chunk: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolPayout {
    pub round: u64,
    pub cursor: u64,
    pub chunk: u32,
    /// Paid so far across the chain.
    pub accumulated: i128,
}

/// The payout round in progress. Shares are taken against `total` as it
/// stood when the round began.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PoolRound {
    pub round: u64,
    pub quantity: i128,
    pub total: i128,
}

/// One bounded unit of batch work.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Task {
    Evaluate(EvalSweep),
    RefreshVoice(VoiceSweep),
    DecayVoice(VoiceSweep),
    Mimic(MimicVote),
    Reward(RewardSweep),
    PoolPayout(PoolPayout),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingTask {
    pub id: u64,
    pub due: u64,
    pub task: Task,
}
