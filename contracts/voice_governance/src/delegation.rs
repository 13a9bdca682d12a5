//! # Delegation graph
//!
//! One outgoing edge per `(scope, delegator)` and a slot-ordered delegator
//! roster per `(scope, delegatee)`. The roster is what the mimic pass walks;
//! its resume cursor is the next slot not yet processed.

use soroban_sdk::{Address, Env, Vec};

use crate::events::{self, DelegationSet, VoteSkipped};
use crate::roster::{self, Roster};
use crate::storage::{self, DataKey};
use crate::types::{Delegation, MimicVote, VoiceScope, VoteOption};
use crate::voice;
use crate::voting;
use crate::Error;

const FULL_WEIGHT_BPS: u32 = 10_000;

pub fn delegatee_of(env: &Env, scope: VoiceScope, delegator: &Address) -> Option<Delegation> {
    storage::read(env, &DataKey::Delegation(scope, delegator.clone()))
}

fn delegator_roster(scope: VoiceScope, delegatee: &Address) -> Roster {
    Roster::Delegators(scope, delegatee.clone())
}

/// Up to `limit` slots of `delegatee`'s delegators, from `cursor`.
pub fn delegators(
    env: &Env,
    scope: VoiceScope,
    delegatee: &Address,
    cursor: u64,
    limit: u32,
) -> Vec<Address> {
    roster::page(env, &delegator_roster(scope, delegatee), cursor, limit).entries
}

pub fn has_delegators(env: &Env, scope: VoiceScope, delegatee: &Address) -> bool {
    !roster::is_empty(env, &delegator_roster(scope, delegatee))
}

fn link(env: &Env, scope: VoiceScope, delegatee: &Address, delegator: &Address) {
    roster::insert(env, &delegator_roster(scope, delegatee), delegator);
}

fn unlink(env: &Env, scope: VoiceScope, delegatee: &Address, delegator: &Address) {
    roster::remove(env, &delegator_roster(scope, delegatee), delegator);
}

/// Follow the chain from `delegatee`; reject if it leads back to
/// `delegator` or does not end within `max_depth` hops.
fn ensure_acyclic(
    env: &Env,
    scope: VoiceScope,
    delegator: &Address,
    delegatee: &Address,
    max_depth: u32,
) -> Result<(), Error> {
    let mut current = delegatee.clone();
    let mut depth = 0u32;
    while let Some(edge) = delegatee_of(env, scope, &current) {
        if edge.delegatee == *delegator {
            return Err(Error::DelegationCycle);
        }
        depth += 1;
        if depth >= max_depth {
            return Err(Error::DelegationCycle);
        }
        current = edge.delegatee;
    }
    Ok(())
}

pub fn delegate(
    env: &Env,
    delegator: &Address,
    delegatee: &Address,
    scope: VoiceScope,
) -> Result<(), Error> {
    if delegator == delegatee {
        return Err(Error::SelfDelegation);
    }
    if voice::get(env, delegator, scope).is_none() {
        return Err(Error::NoVoice);
    }
    let cfg = storage::get_config(env)?;
    ensure_acyclic(env, scope, delegator, delegatee, cfg.max_delegation_depth)?;

    if let Some(previous) = delegatee_of(env, scope, delegator) {
        unlink(env, scope, &previous.delegatee, delegator);
    }
    storage::write(
        env,
        &DataKey::Delegation(scope, delegator.clone()),
        &Delegation {
            delegator: delegator.clone(),
            delegatee: delegatee.clone(),
            weight_bps: FULL_WEIGHT_BPS,
            timestamp: env.ledger().timestamp(),
        },
    );
    link(env, scope, delegatee, delegator);

    events::delegated(
        env,
        DelegationSet {
            delegator: delegator.clone(),
            delegatee: delegatee.clone(),
            scope,
        },
    );
    Ok(())
}

/// Remove the edge of `delegator`. `caller` must be either end of it.
pub fn undelegate(
    env: &Env,
    caller: &Address,
    delegator: &Address,
    scope: VoiceScope,
) -> Result<(), Error> {
    let edge = delegatee_of(env, scope, delegator).ok_or(Error::DelegationNotFound)?;
    if caller != delegator && *caller != edge.delegatee {
        return Err(Error::NotAuthorized);
    }
    storage::remove(env, &DataKey::Delegation(scope, delegator.clone()));
    unlink(env, scope, &edge.delegatee, delegator);

    events::undelegated(
        env,
        DelegationSet {
            delegator: delegator.clone(),
            delegatee: edge.delegatee,
            scope,
        },
    );
    Ok(())
}

/// Share of `balance` matching the fraction `spent / basis` the delegatee used.
pub fn mimic_amount(balance: u64, spent: u64, basis: u64, option: VoteOption) -> u64 {
    if option == VoteOption::Abstain || basis == 0 {
        return 0;
    }
    (balance as u128 * spent as u128 / basis as u128) as u64
}

/// Replay the delegatee's vote for up to `chunk` delegator slots.
pub fn mimic_chunk(env: &Env, task: MimicVote) -> Result<Option<MimicVote>, Error> {
    let page = roster::page::<Address>(
        env,
        &delegator_roster(task.scope, &task.delegatee),
        task.cursor,
        task.chunk,
    );

    for delegator in page.entries.iter() {
        let balance = voice::balance(env, &delegator, task.scope);
        let amount = mimic_amount(balance, task.spent, task.basis, task.option);
        if let Err(err) =
            voting::vote_on_behalf(env, &delegator, task.proposal_id, amount, task.option)
        {
            events::vote_skipped(
                env,
                VoteSkipped {
                    proposal_id: task.proposal_id,
                    delegator,
                    reason: err as u32,
                },
            );
        }
    }

    Ok(page.resume.map(|cursor| MimicVote { cursor, ..task }))
}
