//! # Events
//!
//! Every state transition publishes one event. The first topic is a short
//! symbol naming the transition; the second identifies the subject (a
//! proposal id, an account, a cycle number or a task id). The off-chain
//! indexer decodes these topics.
//!
//! | Topic       | Subject      | Data                 |
//! |-------------|--------------|----------------------|
//! | `created`   | proposal id  | [`ProposalCreated`]  |
//! | `updated`   | proposal id  | creator              |
//! | `cancelled` | proposal id  | [`ProposalCancelled`]|
//! | `staked`    | proposal id  | [`StakeAdded`]       |
//! | `voted`     | proposal id  | [`VoteCast`]         |
//! | `activated` | proposal id  | cycle                |
//! | `approved`  | proposal id  | cycle                |
//! | `paid`      | proposal id  | [`PayoutSent`]       |
//! | `passed`    | proposal id  | cycle                |
//! | `rejected`  | proposal id  | [`ProposalRejected`] |
//! | `delegated` | delegator    | [`DelegationSet`]    |
//! | `undeleg`   | delegator    | [`DelegationSet`]    |
//! | `cycle`     | new cycle    | [`CycleAdvanced`]    |
//! | `decayed`   | -            | timestamp            |
//! | `task`      | task id      | [`TaskLogged`]       |
//! | `skipped`   | proposal id  | [`VoteSkipped`]      |
//! | `pool_paid` | beneficiary  | amount               |
//! | `held`      | proposal id  | [`EvaluationHeld`]   |

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::types::{Fund, VoiceScope, VoteOption};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalCreated {
    pub proposal_id: u64,
    pub creator: Address,
    pub recipient: Address,
    pub quantity: i128,
    pub fund: Fund,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalCancelled {
    pub proposal_id: u64,
    pub creator: Address,
    pub refunded: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakeAdded {
    pub proposal_id: u64,
    pub staker: Address,
    pub amount: i128,
    pub total_staked: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoteCast {
    pub proposal_id: u64,
    pub voter: Address,
    pub option: VoteOption,
    pub amount: u64,
    pub delegated: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PayoutSent {
    pub proposal_id: u64,
    pub recipient: Address,
    pub amount: i128,
    pub age: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalRejected {
    pub proposal_id: u64,
    pub favour: u64,
    pub against: u64,
    pub burned: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DelegationSet {
    pub delegator: Address,
    pub delegatee: Address,
    pub scope: VoiceScope,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CycleAdvanced {
    pub cycle: u32,
    pub quorum_vote_base: u64,
    pub eligible_voters: u64,
    pub active_proposals: u64,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TaskStatus {
    Queued,
    Ran,
    Cancelled,
    Parked,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskLogged {
    pub task_id: u64,
    pub kind: Symbol,
    pub status: TaskStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoteSkipped {
    pub proposal_id: u64,
    pub delegator: Address,
    pub reason: u32,
}

/// An active proposal was left untouched this cycle; `reason` is the
/// contract error code.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EvaluationHeld {
    pub proposal_id: u64,
    pub reason: u32,
}

// ── Publishers ───────────────────────────────────────────────────────

pub fn proposal_created(env: &Env, data: ProposalCreated) {
    env.events()
        .publish((symbol_short!("created"), data.proposal_id), data);
}

pub fn proposal_updated(env: &Env, proposal_id: u64, creator: &Address) {
    env.events()
        .publish((symbol_short!("updated"), proposal_id), creator.clone());
}

pub fn proposal_cancelled(env: &Env, data: ProposalCancelled) {
    env.events()
        .publish((symbol_short!("cancelled"), data.proposal_id), data);
}

pub fn stake_added(env: &Env, data: StakeAdded) {
    env.events()
        .publish((symbol_short!("staked"), data.proposal_id), data);
}

pub fn vote_cast(env: &Env, data: VoteCast) {
    env.events()
        .publish((symbol_short!("voted"), data.proposal_id), data);
}

pub fn proposal_activated(env: &Env, proposal_id: u64, cycle: u32) {
    env.events()
        .publish((symbol_short!("activated"), proposal_id), cycle);
}

pub fn proposal_approved(env: &Env, proposal_id: u64, cycle: u32) {
    env.events()
        .publish((symbol_short!("approved"), proposal_id), cycle);
}

pub fn payout_sent(env: &Env, data: PayoutSent) {
    env.events()
        .publish((symbol_short!("paid"), data.proposal_id), data);
}

pub fn proposal_passed(env: &Env, proposal_id: u64, cycle: u32) {
    env.events()
        .publish((symbol_short!("passed"), proposal_id), cycle);
}

pub fn proposal_rejected(env: &Env, data: ProposalRejected) {
    env.events()
        .publish((symbol_short!("rejected"), data.proposal_id), data);
}

pub fn delegated(env: &Env, data: DelegationSet) {
    env.events()
        .publish((symbol_short!("delegated"), data.delegator.clone()), data);
}

pub fn undelegated(env: &Env, data: DelegationSet) {
    env.events()
        .publish((symbol_short!("undeleg"), data.delegator.clone()), data);
}

pub fn cycle_advanced(env: &Env, data: CycleAdvanced) {
    env.events().publish((symbol_short!("cycle"), data.cycle), data);
}

pub fn decay_started(env: &Env, timestamp: u64) {
    env.events().publish((symbol_short!("decayed"),), timestamp);
}

pub fn task_logged(env: &Env, task_id: u64, kind: Symbol, status: TaskStatus) {
    env.events().publish(
        (symbol_short!("task"), task_id),
        TaskLogged {
            task_id,
            kind,
            status,
        },
    );
}

pub fn vote_skipped(env: &Env, data: VoteSkipped) {
    env.events()
        .publish((symbol_short!("skipped"), data.proposal_id), data);
}

pub fn pool_paid(env: &Env, beneficiary: &Address, amount: i128) {
    env.events()
        .publish((symbol_short!("pool_paid"), beneficiary.clone()), amount);
}

pub fn evaluation_held(env: &Env, proposal_id: u64, reason: u32) {
    env.events().publish(
        (symbol_short!("held"), proposal_id),
        EvaluationHeld {
            proposal_id,
            reason,
        },
    );
}
