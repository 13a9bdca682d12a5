//! # Storage
//!
//! Typed helpers over Soroban's two storage tiers.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key             | Type               | Description                         |
//! |-----------------|--------------------|-------------------------------------|
//! | `Admin`         | `Address`          | Governance administrator            |
//! | `Config`        | `GovernanceConfig` | Numeric parameters                  |
//! | `Collaborators` | `Collaborators`    | External contract addresses         |
//! | `Cycle`         | `CycleState`       | Cycle controller context            |
//! | `ProposalCount` | `u64`              | Last issued proposal id             |
//! | `FundBalance`   | `i128`             | Custodied balance per fund          |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! Proposals (terms + state), votes, the (stage, slot) index, cycle
//! statistics, the last proposal per creator. Voice, delegation, roster, counter,
//! activity, pool and task keys are declared here but owned by their modules.
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.

use soroban_sdk::{contracttype, Address, Env};

use crate::counters::CounterKind;
use crate::roster::{self, Page, Roster};
use crate::types::{
    Collaborators, CycleState, CycleStats, Fund, GovernanceConfig, Proposal, ProposalState,
    ProposalTerms, Stage, Vote, VoiceScope,
};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    Config,
    Collaborators,
    Cycle,
    ProposalCount,
    FundBalance(Fund),
    Terms(u64),
    State(u64),
    Vote(u64, Address),
    LastProposal(Address),
    Stats(u32),
    Counter(CounterKind, u64),
    Voice(Address, VoiceScope),
    LastActive(Address),
    /// Participation of an account in one cycle.
    Participant(u32, Address),
    Delegation(VoiceScope, Address),
    RosterMeta(Roster),
    RosterSlot(Roster, u64),
    RosterPos(Roster, Address),
    RosterIdPos(Roster, u64),
    PoolBalance(Address),
    PoolTotal,
    PoolRound,
    /// Last payout round that paid an account.
    PoolPaid(Address),
    TaskQueue,
    Task(u64),
    /// Task taken off the queue after it failed.
    Parked(u64),
}

// ── Generic helpers ──────────────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
pub fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Extend the TTL for a persistent storage key.
pub fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

pub fn read<T>(env: &Env, key: &DataKey) -> Option<T>
where
    T: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>,
{
    let value = env.storage().persistent().get(key);
    if value.is_some() {
        bump_persistent(env, key);
    }
    value
}

pub fn write<T>(env: &Env, key: &DataKey, value: &T)
where
    T: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    bump_persistent(env, key);
}

pub fn remove(env: &Env, key: &DataKey) {
    env.storage().persistent().remove(key);
}

// ── Instance Storage Helpers ─────────────────────────────────────────

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    bump_instance(env);
}

pub fn get_admin(env: &Env) -> Result<Address, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)
}

/// Require the stored admin's signature.
pub fn require_admin(env: &Env) -> Result<Address, Error> {
    let admin = get_admin(env)?;
    admin.require_auth();
    Ok(admin)
}

pub fn set_config(env: &Env, config: &GovernanceConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn get_config(env: &Env) -> Result<GovernanceConfig, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn set_collaborators(env: &Env, collaborators: &Collaborators) {
    env.storage()
        .instance()
        .set(&DataKey::Collaborators, collaborators);
    bump_instance(env);
}

pub fn get_collaborators(env: &Env) -> Result<Collaborators, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Collaborators)
        .ok_or(Error::NotInitialized)
}

pub fn get_cycle(env: &Env) -> CycleState {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Cycle)
        .unwrap_or(CycleState {
            cycle: 0,
            last_period: 0,
            last_decay: 0,
        })
}

pub fn set_cycle(env: &Env, cycle: &CycleState) {
    env.storage().instance().set(&DataKey::Cycle, cycle);
    bump_instance(env);
}

/// Reads, increments, and stores the proposal counter.
/// Returns the id for the new proposal (ids start at 1).
pub fn next_proposal_id(env: &Env) -> u64 {
    bump_instance(env);
    let last: u64 = env
        .storage()
        .instance()
        .get(&DataKey::ProposalCount)
        .unwrap_or(0);
    let id = last + 1;
    env.storage().instance().set(&DataKey::ProposalCount, &id);
    id
}

pub fn proposal_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::ProposalCount)
        .unwrap_or(0)
}

pub fn fund_balance(env: &Env, fund: Fund) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::FundBalance(fund))
        .unwrap_or(0)
}

pub fn set_fund_balance(env: &Env, fund: Fund, balance: i128) {
    env.storage()
        .instance()
        .set(&DataKey::FundBalance(fund), &balance);
    bump_instance(env);
}

// ── Proposals ────────────────────────────────────────────────────────

pub fn save_terms(env: &Env, terms: &ProposalTerms) {
    write(env, &DataKey::Terms(terms.id), terms);
}

pub fn save_state(env: &Env, id: u64, state: &ProposalState) {
    write(env, &DataKey::State(id), state);
}

pub fn load_terms(env: &Env, id: u64) -> Result<ProposalTerms, Error> {
    read(env, &DataKey::Terms(id)).ok_or(Error::ProposalNotFound)
}

pub fn load_state(env: &Env, id: u64) -> Result<ProposalState, Error> {
    read(env, &DataKey::State(id)).ok_or(Error::ProposalNotFound)
}

pub fn has_proposal(env: &Env, id: u64) -> bool {
    env.storage().persistent().has(&DataKey::State(id))
}

pub fn delete_proposal(env: &Env, id: u64) {
    remove(env, &DataKey::Terms(id));
    remove(env, &DataKey::State(id));
}

/// Load the full `Proposal` by combining terms and state.
pub fn load_proposal(env: &Env, id: u64) -> Result<Proposal, Error> {
    let terms = load_terms(env, id)?;
    let state = load_state(env, id)?;
    Ok(Proposal {
        id: terms.id,
        creator: terms.creator,
        recipient: terms.recipient,
        quantity: terms.quantity,
        fund: terms.fund,
        campaign: terms.campaign,
        invite: terms.invite,
        created_at: terms.created_at,
        text: terms.text,
        schedule: terms.schedule,
        staked: state.staked,
        current_payout: state.current_payout,
        favour: state.favour,
        against: state.against,
        total: state.total,
        status: state.status,
        stage: state.stage,
        age: state.age,
        passed_cycle: state.passed_cycle,
        executed: state.executed,
        campaign_id: state.campaign_id,
    })
}

pub fn load_vote(env: &Env, id: u64, voter: &Address) -> Option<Vote> {
    read(env, &DataKey::Vote(id, voter.clone()))
}

pub fn save_vote(env: &Env, vote: &Vote) {
    write(env, &DataKey::Vote(vote.proposal_id, vote.voter.clone()), vote);
}

pub fn set_last_proposal(env: &Env, creator: &Address, id: u64) {
    write(env, &DataKey::LastProposal(creator.clone()), &id);
}

pub fn last_proposal(env: &Env, creator: &Address) -> Option<u64> {
    read(env, &DataKey::LastProposal(creator.clone()))
}

// ── Stage index ──────────────────────────────────────────────────────

fn stage_roster(stage: Stage) -> Roster {
    Roster::Stage(stage)
}

pub fn index_insert(env: &Env, stage: Stage, id: u64) {
    if stage != Stage::Done {
        roster::insert(env, &stage_roster(stage), &id);
    }
}

pub fn index_remove(env: &Env, stage: Stage, id: u64) {
    if stage != Stage::Done {
        roster::remove(env, &stage_roster(stage), &id);
    }
}

/// Move a proposal between stage indices.
pub fn index_move(env: &Env, id: u64, from: Stage, to: Stage) {
    index_remove(env, from, id);
    index_insert(env, to, id);
}

/// Slot the next proposal entering `stage` will get.
pub fn index_end(env: &Env, stage: Stage) -> u64 {
    roster::meta(env, &stage_roster(stage)).next
}

/// Proposal ids of `stage` in slots `[from, upto)`, at most `limit` slots.
pub fn index_page(env: &Env, stage: Stage, from: u64, upto: u64, limit: u32) -> Page<u64> {
    roster::page_until(env, &stage_roster(stage), from, upto, limit)
}

// ── Cycle statistics ─────────────────────────────────────────────────

pub fn load_stats(env: &Env, cycle: u32) -> Option<CycleStats> {
    read(env, &DataKey::Stats(cycle))
}

pub fn save_stats(env: &Env, stats: &CycleStats) {
    write(env, &DataKey::Stats(stats.cycle), stats);
}
