//! # External collaborators
//!
//! Cross-contract interfaces this contract calls, and the thin wrappers the
//! rest of the crate uses so that no module builds clients by hand.
//!
//! | Collaborator | Calls                                   |
//! |--------------|-----------------------------------------|
//! | Token (SAC)  | `transfer`, `burn`                      |
//! | Membership   | `status_of`                             |
//! | Rank source  | `rank_of`                               |
//! | Reputation   | `add_reputation`, `punish`              |
//! | Escrow       | `lock`                                  |
//! | Campaigns    | `create_campaign`, `return_funds`       |

use soroban_sdk::{contractclient, symbol_short, token, Address, Env, String, Symbol};

use crate::storage;
use crate::types::{Collaborators, MemberStatus};
use crate::Error;

/// Far-future horizon for escrow locks released by the arbiter.
const ESCROW_LOCK_SECS: u64 = 10 * 365 * 86_400;

#[contractclient(name = "MembershipClient")]
pub trait Membership {
    fn status_of(env: Env, account: Address) -> MemberStatus;
}

#[contractclient(name = "RankSourceClient")]
pub trait RankSource {
    fn rank_of(env: Env, account: Address) -> u64;
}

#[contractclient(name = "ReputationClient")]
pub trait Reputation {
    fn add_reputation(env: Env, account: Address, points: u32);
    fn punish(env: Env, account: Address, points: u32);
}

#[contractclient(name = "EscrowClient")]
pub trait Escrow {
    #[allow(clippy::too_many_arguments)]
    fn lock(
        env: Env,
        category: Symbol,
        funder: Address,
        recipient: Address,
        amount: i128,
        condition: Symbol,
        arbiter: Address,
        expiry: u64,
        memo: String,
    );
}

#[contractclient(name = "CampaignsClient")]
pub trait Campaigns {
    #[allow(clippy::too_many_arguments)]
    fn create_campaign(
        env: Env,
        origin: Address,
        owner: Address,
        max_amount_per_invite: i128,
        planted: i128,
        reward_owner: Address,
        reward: i128,
        total: i128,
        proposal_id: u64,
    ) -> u64;
    fn return_funds(env: Env, campaign_id: u64);
}

fn collaborators(env: &Env) -> Result<Collaborators, Error> {
    storage::get_collaborators(env)
}

// ── Membership ───────────────────────────────────────────────────────

pub fn member_status(env: &Env, account: &Address) -> Result<MemberStatus, Error> {
    let c = collaborators(env)?;
    Ok(MembershipClient::new(env, &c.membership).status_of(account))
}

pub fn require_resident(env: &Env, account: &Address) -> Result<(), Error> {
    match member_status(env, account)? {
        MemberStatus::Resident | MemberStatus::Citizen => Ok(()),
        MemberStatus::Visitor => Err(Error::NotResident),
    }
}

pub fn require_citizen(env: &Env, account: &Address) -> Result<(), Error> {
    match member_status(env, account)? {
        MemberStatus::Citizen => Ok(()),
        _ => Err(Error::NotCitizen),
    }
}

// ── Rank & reputation ────────────────────────────────────────────────

pub fn rank_of(env: &Env, account: &Address) -> Result<u64, Error> {
    let c = collaborators(env)?;
    Ok(RankSourceClient::new(env, &c.rank_source).rank_of(account))
}

pub fn add_reputation(env: &Env, account: &Address, points: u32) -> Result<(), Error> {
    if points == 0 {
        return Ok(());
    }
    let c = collaborators(env)?;
    ReputationClient::new(env, &c.reputation).add_reputation(account, &points);
    Ok(())
}

pub fn punish(env: &Env, account: &Address, points: u32) -> Result<(), Error> {
    let c = collaborators(env)?;
    ReputationClient::new(env, &c.reputation).punish(account, &points);
    Ok(())
}

// ── Token movements ──────────────────────────────────────────────────

/// Pull `amount` from `from` into contract custody.
pub fn receive(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
    let c = collaborators(env)?;
    token::Client::new(env, &c.token).transfer(from, &env.current_contract_address(), &amount);
    Ok(())
}

/// Send `amount` out of contract custody. Zero amounts are skipped.
pub fn send(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
    if amount == 0 {
        return Ok(());
    }
    let c = collaborators(env)?;
    token::Client::new(env, &c.token).transfer(&env.current_contract_address(), to, &amount);
    Ok(())
}

/// Destroy `amount` of custodied tokens.
pub fn burn(env: &Env, amount: i128) -> Result<(), Error> {
    if amount == 0 {
        return Ok(());
    }
    let c = collaborators(env)?;
    token::Client::new(env, &c.token).burn(&env.current_contract_address(), &amount);
    Ok(())
}

// ── Escrow & campaigns ───────────────────────────────────────────────

/// Move `amount` to the escrow service and lock it for `recipient`.
pub fn lock_in_escrow(
    env: &Env,
    recipient: &Address,
    amount: i128,
    memo: String,
) -> Result<(), Error> {
    if amount == 0 {
        return Ok(());
    }
    let c = collaborators(env)?;
    send(env, &c.escrow, amount)?;
    let expiry = env.ledger().timestamp().saturating_add(ESCROW_LOCK_SECS);
    EscrowClient::new(env, &c.escrow).lock(
        &symbol_short!("event"),
        &env.current_contract_address(),
        recipient,
        &amount,
        &symbol_short!("golive"),
        &c.escrow_arbiter,
        &expiry,
        &memo,
    );
    Ok(())
}

/// Fund an invite campaign with `total` and return the new campaign id.
#[allow(clippy::too_many_arguments)]
pub fn create_campaign(
    env: &Env,
    owner: &Address,
    max_amount_per_invite: i128,
    planted: i128,
    reward_owner: &Address,
    reward: i128,
    total: i128,
    proposal_id: u64,
) -> Result<u64, Error> {
    let c = collaborators(env)?;
    send(env, &c.campaigns, total)?;
    Ok(CampaignsClient::new(env, &c.campaigns).create_campaign(
        &env.current_contract_address(),
        owner,
        &max_amount_per_invite,
        &planted,
        reward_owner,
        &reward,
        &total,
        &proposal_id,
    ))
}

pub fn return_campaign_funds(env: &Env, campaign_id: u64) -> Result<(), Error> {
    let c = collaborators(env)?;
    CampaignsClient::new(env, &c.campaigns).return_funds(&campaign_id);
    Ok(())
}

pub fn milestone_recipient(env: &Env) -> Result<Address, Error> {
    Ok(collaborators(env)?.milestone_recipient)
}
