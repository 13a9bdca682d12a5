//! # Voting
//!
//! A vote is checked completely before anything is written, so the mimic
//! pass can try a delegated vote and skip the delegator on any error
//! without leaving partial state behind.
//!
//! Rules:
//! - only citizens vote, only on active proposals that have not executed;
//! - new votes need `Open`; during `Evaluate` the only accepted ballot is a
//!   distrust that replaces the voter's earlier trust;
//! - direct votes are refused while the voter delegates in that scope;
//! - a direct vote by an account with delegators queues a mimic task.

use soroban_sdk::{Address, Env};

use crate::activity;
use crate::delegation;
use crate::events::{self, VoteCast};
use crate::external;
use crate::roster::{self, Roster};
use crate::scheduler;
use crate::storage::{self, DataKey};
use crate::types::{
    GovernanceConfig, MimicVote, Participant, ProposalState, Stage, Status, Task, VoiceScope,
    Vote, VoteOption,
};
use crate::voice;
use crate::Error;

/// A vote that passed every check.
struct Ballot {
    proposal_id: u64,
    voter: Address,
    amount: u64,
    option: VoteOption,
    scope: VoiceScope,
    state: ProposalState,
    replaces: Option<Vote>,
}

fn check(
    env: &Env,
    voter: &Address,
    proposal_id: u64,
    amount: u64,
    option: VoteOption,
    direct: bool,
) -> Result<Ballot, Error> {
    let terms = storage::load_terms(env, proposal_id)?;
    let state = storage::load_state(env, proposal_id)?;

    if state.executed {
        return Err(Error::AlreadyExecuted);
    }
    if state.stage != Stage::Active {
        return Err(Error::NotActive);
    }
    if state.status != Status::Open && state.status != Status::Evaluate {
        return Err(Error::VotingClosed);
    }
    external::require_citizen(env, voter)?;

    let scope = terms.fund.fund_type().scope();
    if direct && delegation::delegatee_of(env, scope, voter).is_some() {
        return Err(Error::VoiceDelegated);
    }

    let replaces = match (storage::load_vote(env, proposal_id, voter), state.status) {
        (None, Status::Open) => None,
        (None, _) => return Err(Error::VotingClosed),
        (Some(prior), Status::Evaluate)
            if option == VoteOption::Distrust && prior.option == VoteOption::Trust =>
        {
            Some(prior)
        }
        (Some(_), _) => return Err(Error::AlreadyVoted),
    };

    let available = voice::get(env, voter, scope).ok_or(Error::NoVoice)?;
    if amount > available {
        return Err(Error::InsufficientVoice);
    }

    Ok(Ballot {
        proposal_id,
        voter: voter.clone(),
        amount,
        option,
        scope,
        state,
        replaces,
    })
}

/// Apply a checked ballot. Returns the voter's balance before the debit.
fn commit(
    env: &Env,
    cfg: &GovernanceConfig,
    ballot: Ballot,
    delegated: bool,
) -> Result<u64, Error> {
    let Ballot {
        proposal_id,
        voter,
        amount,
        option,
        scope,
        mut state,
        replaces,
    } = ballot;

    let before = voice::debit(env, &voter, scope, amount)?;

    if let Some(prior) = &replaces {
        state.favour = state.favour.saturating_sub(prior.amount);
    }
    match option {
        VoteOption::Trust => state.favour = state.favour.saturating_add(amount),
        VoteOption::Distrust => state.against = state.against.saturating_add(amount),
        VoteOption::Abstain => {}
    }
    state.total = state.favour.saturating_add(state.against);
    storage::save_state(env, proposal_id, &state);

    storage::save_vote(
        env,
        &Vote {
            proposal_id,
            voter: voter.clone(),
            amount,
            favour: option == VoteOption::Trust,
            option,
        },
    );

    let is_new = replaces.is_none();
    if is_new {
        if option != VoteOption::Abstain {
            let points = if delegated {
                cfg.vote_rep.saturating_mul(cfg.delegated_rep_pct) / 100
            } else {
                cfg.vote_rep
            };
            external::add_reputation(env, &voter, points)?;
        }
        record_participation(env, &voter, option);
    }

    activity::touch(env, &voter);
    record_cycle_votes(env, option, amount, is_new);

    events::vote_cast(
        env,
        VoteCast {
            proposal_id,
            voter,
            option,
            amount,
            delegated,
        },
    );
    Ok(before)
}

fn record_participation(env: &Env, voter: &Address, option: VoteOption) {
    let cycle = storage::get_cycle(env).cycle;
    let key = DataKey::Participant(cycle, voter.clone());
    let non_neutral = option != VoteOption::Abstain;
    let record = match storage::read::<Participant>(env, &key) {
        Some(mut p) => {
            p.count += 1;
            p.non_neutral |= non_neutral;
            p
        }
        None => {
            roster::insert(env, &Roster::Participants(cycle), voter);
            Participant {
                count: 1,
                non_neutral,
            }
        }
    };
    storage::write(env, &key, &record);
}

fn record_cycle_votes(env: &Env, option: VoteOption, amount: u64, is_new: bool) {
    let cycle = storage::get_cycle(env).cycle;
    if let Some(mut stats) = storage::load_stats(env, cycle) {
        if is_new {
            stats.num_votes += 1;
        }
        stats.total_voice_cast = stats.total_voice_cast.saturating_add(amount);
        match option {
            VoteOption::Trust => stats.total_favour = stats.total_favour.saturating_add(amount),
            VoteOption::Distrust => {
                stats.total_against = stats.total_against.saturating_add(amount)
            }
            VoteOption::Abstain => {}
        }
        storage::save_stats(env, &stats);
    }
}

/// Queue a mimic pass when `delegatee` has delegators in `scope`.
#[allow(clippy::too_many_arguments)]
fn propagate(
    env: &Env,
    cfg: &GovernanceConfig,
    delegatee: &Address,
    scope: VoiceScope,
    proposal_id: u64,
    option: VoteOption,
    spent: u64,
    basis: u64,
) {
    if !delegation::has_delegators(env, scope, delegatee) {
        return;
    }
    scheduler::enqueue(
        env,
        Task::Mimic(MimicVote {
            delegatee: delegatee.clone(),
            scope,
            proposal_id,
            option,
            spent,
            basis,
            cursor: 0,
            chunk: cfg.batch_size,
        }),
        0,
    );
}

/// Direct vote by `voter`, who has already authorized the call.
pub fn vote(
    env: &Env,
    voter: &Address,
    proposal_id: u64,
    amount: u64,
    option: VoteOption,
) -> Result<(), Error> {
    let cfg = storage::get_config(env)?;
    let ballot = check(env, voter, proposal_id, amount, option, true)?;
    let scope = ballot.scope;
    let basis = commit(env, &cfg, ballot, false)?;
    propagate(env, &cfg, voter, scope, proposal_id, option, amount, basis);
    Ok(())
}

/// Vote replayed on behalf of a delegator by the mimic pass.
pub fn vote_on_behalf(
    env: &Env,
    voter: &Address,
    proposal_id: u64,
    amount: u64,
    option: VoteOption,
) -> Result<(), Error> {
    let cfg = storage::get_config(env)?;
    let ballot = check(env, voter, proposal_id, amount, option, false)?;
    let scope = ballot.scope;
    let basis = commit(env, &cfg, ballot, true)?;
    propagate(env, &cfg, voter, scope, proposal_id, option, amount, basis);
    Ok(())
}
