//! # Voice Governance Contract
//!
//! Stake-backed funding proposals decided by voice-weighted votes over
//! recurring cycles. Accounts stake collateral behind a proposal, citizens
//! vote with non-transferable voice (optionally delegated), and proposals
//! that clear quorum and majority are paid out slice by slice, one slice
//! per cycle.
//!
//! | Phase        | Entry Point(s)                                              |
//! |--------------|-------------------------------------------------------------|
//! | Bootstrap    | [`VoiceGovernance::init`], `set_config`, `set_collaborators` |
//! | Proposals    | `create_proposal`, `create_invite`, `update_proposal`, `cancel_proposal` |
//! | Staking      | `stake`, `check_stake`, `min_stake`, `fund_deposit`         |
//! | Voting       | `favour`, `against`, `neutral`, `delegate`, `undelegate`    |
//! | Cycles       | `on_period`, `recompute_active_count`, `set_counter`        |
//! | Voice        | `grant_voice`, `revoke_voice`, `change_trust`, `add_active`, `refresh_voice`, `decay_voices`, `decay_voice` |
//! | Pool         | `pool_deposit`, `pool_payouts`, `pool_payout`, `pool_round` |
//! | Batch work   | `crank`, `cancel_task`, `retry_task`, `mimic_vote`          |
//! | Queries      | `get_proposal`, `get_vote`, `get_stats`, `voice_of`, ...    |
//!
//! ## Architecture
//!
//! This file holds only the entry points: authorization and dispatch. State
//! lives in [`storage`]; each concern has its own module. Every batched
//! operation runs its first chunk inline and leaves the rest of the chain in
//! the [`scheduler`] queue for `crank`.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, Vec};

mod activity;
mod config;
mod counters;
mod cycle;
mod delegation;
pub mod events;
mod external;
mod pool;
mod proposals;
mod roster;
mod scheduler;
mod storage;
pub mod types;
mod voice;
mod voting;

#[cfg(test)]
mod test_cycle;
#[cfg(test)]
mod test_delegation;
#[cfg(test)]
mod testutils;

pub use counters::CounterKind;
pub use scheduler::QueueBounds;
pub use types::{
    Collaborators, CycleState, CycleStats, Delegation, Fund, GovernanceConfig, InviteTerms,
    MemberStatus, Participant, PendingTask, PoolRound, Proposal, ProposalText, Stage, StakeRule,
    Status, Task, VoiceScope, VoiceSweep, Vote, VoteOption,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NotAuthorized = 3,
    ProposalNotFound = 4,
    InvalidSchedule = 5,
    InvalidQuantity = 6,
    InvalidRecipient = 7,
    NotResident = 8,
    NotCitizen = 9,
    ProposalNotOpen = 10,
    HasVotes = 11,
    StakeCapExceeded = 12,
    NoProposal = 13,
    AlreadyExecuted = 14,
    NotActive = 15,
    VotingClosed = 16,
    AlreadyVoted = 17,
    VoiceDelegated = 18,
    NoVoice = 19,
    InsufficientVoice = 20,
    DelegationCycle = 21,
    SelfDelegation = 22,
    DelegationNotFound = 23,
    NoEligibleVoters = 24,
    FundExhausted = 25,
    InvalidConfig = 26,
    InvalidInvite = 27,
    TaskNotFound = 28,
    InvalidChunkSize = 29,
    PoolEmpty = 30,
    DecayNotDue = 31,
    VoteNotFound = 32,
    ArithmeticOverflow = 33,
    NoPayoutRound = 34,
}

#[contract]
pub struct VoiceGovernance;

#[contractimpl]
impl VoiceGovernance {
    // ─────────────────────────────────────────────────────────
    // Bootstrap
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract. Must be called exactly once after deployment.
    pub fn init(
        env: Env,
        admin: Address,
        config: GovernanceConfig,
        collaborators: Collaborators,
    ) -> Result<(), Error> {
        admin.require_auth();
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        config::validate(&config)?;
        storage::set_admin(&env, &admin);
        storage::set_config(&env, &config);
        storage::set_collaborators(&env, &collaborators);
        storage::set_cycle(&env, &storage::get_cycle(&env));
        Ok(())
    }

    pub fn set_config(env: Env, config: GovernanceConfig) -> Result<(), Error> {
        storage::require_admin(&env)?;
        config::validate(&config)?;
        storage::set_config(&env, &config);
        Ok(())
    }

    pub fn set_collaborators(env: Env, collaborators: Collaborators) -> Result<(), Error> {
        storage::require_admin(&env)?;
        storage::set_collaborators(&env, &collaborators);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Proposals
    // ─────────────────────────────────────────────────────────

    /// Create an ordinary proposal. `schedule` defaults to `[25, 25, 25, 25]`.
    pub fn create_proposal(
        env: Env,
        creator: Address,
        recipient: Address,
        quantity: i128,
        fund: Fund,
        text: ProposalText,
        schedule: Option<Vec<u32>>,
    ) -> Result<u64, Error> {
        creator.require_auth();
        proposals::create(&env, &creator, &recipient, quantity, fund, text, schedule)
    }

    /// Create an invite-campaign proposal with the fixed one-shot schedule.
    pub fn create_invite(
        env: Env,
        creator: Address,
        recipient: Address,
        quantity: i128,
        text: ProposalText,
        invite: InviteTerms,
    ) -> Result<u64, Error> {
        creator.require_auth();
        proposals::create_invite(&env, &creator, &recipient, quantity, text, invite)
    }

    pub fn update_proposal(
        env: Env,
        creator: Address,
        proposal_id: u64,
        text: ProposalText,
        schedule: Option<Vec<u32>>,
    ) -> Result<(), Error> {
        creator.require_auth();
        proposals::update(&env, &creator, proposal_id, text, schedule)
    }

    pub fn cancel_proposal(env: Env, creator: Address, proposal_id: u64) -> Result<(), Error> {
        creator.require_auth();
        proposals::cancel(&env, &creator, proposal_id)
    }

    /// Stake toward `proposal_id`, or toward the caller's latest proposal.
    pub fn stake(
        env: Env,
        from: Address,
        proposal_id: Option<u64>,
        amount: i128,
    ) -> Result<i128, Error> {
        from.require_auth();
        proposals::stake(&env, &from, proposal_id, amount)
    }

    pub fn check_stake(env: Env, proposal_id: u64) -> Result<bool, Error> {
        proposals::check_stake(&env, proposal_id)
    }

    pub fn min_stake(env: Env, proposal_id: u64) -> Result<i128, Error> {
        proposals::min_stake(&env, proposal_id)
    }

    /// Top up a fund pool that approved proposals are paid from.
    pub fn fund_deposit(env: Env, from: Address, fund: Fund, amount: i128) -> Result<i128, Error> {
        from.require_auth();
        proposals::fund_deposit(&env, &from, fund, amount)
    }

    // ─────────────────────────────────────────────────────────
    // Voting & delegation
    // ─────────────────────────────────────────────────────────

    pub fn favour(env: Env, voter: Address, proposal_id: u64, amount: u64) -> Result<(), Error> {
        voter.require_auth();
        voting::vote(&env, &voter, proposal_id, amount, VoteOption::Trust)
    }

    pub fn against(env: Env, voter: Address, proposal_id: u64, amount: u64) -> Result<(), Error> {
        voter.require_auth();
        voting::vote(&env, &voter, proposal_id, amount, VoteOption::Distrust)
    }

    pub fn neutral(env: Env, voter: Address, proposal_id: u64) -> Result<(), Error> {
        voter.require_auth();
        voting::vote(&env, &voter, proposal_id, 0, VoteOption::Abstain)
    }

    pub fn delegate(
        env: Env,
        delegator: Address,
        delegatee: Address,
        scope: VoiceScope,
    ) -> Result<(), Error> {
        delegator.require_auth();
        delegation::delegate(&env, &delegator, &delegatee, scope)
    }

    /// Remove `delegator`'s edge. Either end of the edge may call.
    pub fn undelegate(
        env: Env,
        caller: Address,
        delegator: Address,
        scope: VoiceScope,
    ) -> Result<(), Error> {
        caller.require_auth();
        delegation::undelegate(&env, &caller, &delegator, scope)
    }

    /// Restart the mimic pass for `delegatee`'s vote on `proposal_id` from
    /// `cursor`. Returns the id of the queued continuation, if any.
    pub fn mimic_vote(
        env: Env,
        delegatee: Address,
        proposal_id: u64,
        cursor: u64,
        chunk: u32,
    ) -> Result<Option<u64>, Error> {
        storage::require_admin(&env)?;
        let vote = storage::load_vote(&env, proposal_id, &delegatee).ok_or(Error::VoteNotFound)?;
        let scope = storage::load_terms(&env, proposal_id)?.fund.fund_type().scope();
        let basis = voice::balance(&env, &delegatee, scope).saturating_add(vote.amount);
        scheduler::run_inline(
            &env,
            Task::Mimic(types::MimicVote {
                delegatee,
                scope,
                proposal_id,
                option: vote.option,
                spent: vote.amount,
                basis,
                cursor,
                chunk,
            }),
        )
    }

    // ─────────────────────────────────────────────────────────
    // Cycles
    // ─────────────────────────────────────────────────────────

    /// Close the current cycle and queue its evaluation. Returns the new cycle.
    pub fn on_period(env: Env) -> Result<u32, Error> {
        storage::require_admin(&env)?;
        cycle::on_period(&env)
    }

    pub fn recompute_active_count(env: Env) -> Result<u64, Error> {
        storage::require_admin(&env)?;
        Ok(cycle::recompute_active_count(&env))
    }

    pub fn set_counter(env: Env, kind: CounterKind, scope: u64, value: u64) -> Result<(), Error> {
        storage::require_admin(&env)?;
        counters::set_scoped(&env, kind, scope, value);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Voice
    // ─────────────────────────────────────────────────────────

    pub fn grant_voice(env: Env, account: Address, amount: u64) -> Result<(), Error> {
        storage::require_admin(&env)?;
        voice::grant(&env, &account, amount);
        Ok(())
    }

    pub fn revoke_voice(env: Env, account: Address) -> Result<(), Error> {
        storage::require_admin(&env)?;
        voice::erase(&env, &account);
        Ok(())
    }

    /// Recover voice for a newly trusted account, or revoke it from an
    /// account that lost trust.
    pub fn change_trust(env: Env, account: Address, trusted: bool) -> Result<(), Error> {
        storage::require_admin(&env)?;
        let holder = voice::is_holder(&env, &account);
        if trusted && !holder {
            let cfg = storage::get_config(&env)?;
            voice::recover(&env, &cfg, &account)?;
        } else if !trusted && holder {
            voice::erase(&env, &account);
        }
        Ok(())
    }

    /// Mark `account` active. Newly tracked accounts get their voice recovered.
    pub fn add_active(env: Env, account: Address) -> Result<bool, Error> {
        storage::require_admin(&env)?;
        let is_new = activity::touch(&env, &account);
        if is_new {
            let cfg = storage::get_config(&env)?;
            voice::recover(&env, &cfg, &account)?;
        }
        Ok(is_new)
    }

    /// Reset voice to rank for holders from `cursor`.
    pub fn refresh_voice(env: Env, cursor: u64, chunk: u32) -> Result<Option<u64>, Error> {
        storage::require_admin(&env)?;
        scheduler::run_inline(&env, Task::RefreshVoice(VoiceSweep { cursor, chunk }))
    }

    /// Start a decay pass if the decay window is open.
    pub fn decay_voices(env: Env) -> Result<Option<u64>, Error> {
        storage::require_admin(&env)?;
        let cfg = storage::get_config(&env)?;
        voice::start_decay(&env, &cfg)?;
        scheduler::run_inline(
            &env,
            Task::DecayVoice(VoiceSweep {
                cursor: 0,
                chunk: cfg.batch_size,
            }),
        )
    }

    /// Run one decay chunk from `cursor` without the time gate.
    pub fn decay_voice(env: Env, cursor: u64, chunk: u32) -> Result<Option<u64>, Error> {
        storage::require_admin(&env)?;
        scheduler::run_inline(&env, Task::DecayVoice(VoiceSweep { cursor, chunk }))
    }

    // ─────────────────────────────────────────────────────────
    // Redemption pool
    // ─────────────────────────────────────────────────────────

    pub fn pool_deposit(
        env: Env,
        from: Address,
        beneficiary: Address,
        amount: i128,
    ) -> Result<i128, Error> {
        from.require_auth();
        pool::deposit(&env, &from, &beneficiary, amount)
    }

    /// Distribute `quantity` across the pool in proportion to balances.
    pub fn pool_payouts(env: Env, quantity: i128) -> Result<Option<u64>, Error> {
        storage::require_admin(&env)?;
        let cfg = storage::get_config(&env)?;
        let start = pool::start_payout(&env, quantity, cfg.batch_size)?;
        scheduler::run_inline(&env, Task::PoolPayout(start))
    }

    /// Resume the current payout round from an explicit cursor and
    /// accumulator. Beneficiaries already paid this round are skipped.
    pub fn pool_payout(
        env: Env,
        cursor: u64,
        chunk: u32,
        accumulated: i128,
    ) -> Result<Option<u64>, Error> {
        storage::require_admin(&env)?;
        let resume = pool::resume_payout(&env, cursor, chunk, accumulated)?;
        scheduler::run_inline(&env, Task::PoolPayout(resume))
    }

    pub fn pool_round(env: Env) -> PoolRound {
        pool::round(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Scheduler
    // ─────────────────────────────────────────────────────────

    /// Run up to `max` due tasks. Anyone may call.
    pub fn crank(env: Env, max: u32) -> Result<u32, Error> {
        scheduler::crank(&env, max)
    }

    pub fn cancel_task(env: Env, task_id: u64) -> Result<(), Error> {
        storage::require_admin(&env)?;
        scheduler::cancel(&env, task_id)
    }

    /// Re-queue a task that failed under `crank`. Returns its new id.
    pub fn retry_task(env: Env, task_id: u64) -> Result<u64, Error> {
        storage::require_admin(&env)?;
        scheduler::retry(&env, task_id)
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_proposal(env: Env, proposal_id: u64) -> Result<Proposal, Error> {
        storage::load_proposal(&env, proposal_id)
    }

    pub fn get_vote(env: Env, proposal_id: u64, voter: Address) -> Option<Vote> {
        storage::load_vote(&env, proposal_id, &voter)
    }

    /// Proposal ids of `stage` found in `limit` index slots from `cursor`.
    pub fn stage_ids(env: Env, stage: Stage, cursor: u64, limit: u32) -> Vec<u64> {
        storage::index_page(&env, stage, cursor, u64::MAX, limit).entries
    }

    pub fn get_config(env: Env) -> Result<GovernanceConfig, Error> {
        storage::get_config(&env)
    }

    pub fn get_cycle(env: Env) -> CycleState {
        storage::get_cycle(&env)
    }

    pub fn get_stats(env: Env, cycle: u32) -> Option<CycleStats> {
        storage::load_stats(&env, cycle)
    }

    pub fn voice_of(env: Env, account: Address, scope: VoiceScope) -> u64 {
        voice::balance(&env, &account, scope)
    }

    pub fn delegation_of(env: Env, scope: VoiceScope, delegator: Address) -> Option<Delegation> {
        delegation::delegatee_of(&env, scope, &delegator)
    }

    pub fn delegators_of(
        env: Env,
        scope: VoiceScope,
        delegatee: Address,
        cursor: u64,
        limit: u32,
    ) -> Vec<Address> {
        delegation::delegators(&env, scope, &delegatee, cursor, limit)
    }

    pub fn last_active(env: Env, account: Address) -> Option<u64> {
        activity::last_active(&env, &account)
    }

    pub fn participant(env: Env, cycle: u32, account: Address) -> Option<Participant> {
        storage::read(&env, &storage::DataKey::Participant(cycle, account))
    }

    pub fn counter(env: Env, kind: CounterKind, scope: u64) -> u64 {
        counters::get_scoped(&env, kind, scope)
    }

    pub fn fund_balance(env: Env, fund: Fund) -> i128 {
        storage::fund_balance(&env, fund)
    }

    pub fn pool_balance(env: Env, account: Address) -> i128 {
        pool::balance(&env, &account)
    }

    pub fn pool_total(env: Env) -> i128 {
        pool::total(&env)
    }

    pub fn pending_task(env: Env, task_id: u64) -> Option<PendingTask> {
        scheduler::pending(&env, task_id)
    }

    pub fn parked_task(env: Env, task_id: u64) -> Option<PendingTask> {
        scheduler::parked(&env, task_id)
    }

    pub fn task_queue(env: Env) -> QueueBounds {
        scheduler::bounds(&env)
    }
}
