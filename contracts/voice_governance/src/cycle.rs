//! # Cycle controller
//!
//! `on_period` closes the current cycle, opens the next one with a frozen
//! quorum base, and queues three chains:
//!
//! 1. the evaluation sweep over the closed cycle (active proposals first,
//!    then staged proposals that existed when the cycle closed);
//! 2. the voice refresh;
//! 3. the participation reward sweep.
//!
//! Evaluation of a single proposal:
//!
//! ```text
//! staged  + enough stake             ──► active (listed in the cycle's active_props)
//! open    + majority + quorum        ──► evaluate, refund stake, slice 0
//! eval    + majority                 ──► slice(age + 1); last slice ──► passed / done
//! otherwise                          ──► rejected / done (burn stake or punish creator)
//! ```
//!
//! An active proposal whose evaluation fails (say, its fund is short) is
//! held: it keeps its stage and status, a `held` event records the error,
//! and the sweep moves on. The next cycle evaluates it again.

use soroban_sdk::{log, Address, Env, Vec};

use crate::config;
use crate::counters::{self, CounterKind};
use crate::events::{self, CycleAdvanced, ProposalRejected};
use crate::external;
use crate::proposals;
use crate::roster::{self, Roster};
use crate::scheduler;
use crate::storage::{self, DataKey};
use crate::types::{
    CycleStats, EvalSweep, GovernanceConfig, Participant, ProposalState, ProposalTerms,
    RewardSweep, Stage, Status, SweepPhase, Task, VoiceSweep,
};
use crate::Error;

const RECOUNT_CHUNK: u32 = 50;

/// Per-cycle quorum inputs the evaluation sweep reads.
struct Quorum {
    eligible: u64,
    needed: u64,
}

/// An empty eligible-voter snapshot falls back to the live counter, so an
/// admin can unblock evaluation by seeding `ActiveUsers`.
fn quorum_for(env: &Env, cycle: u32) -> Quorum {
    match storage::load_stats(env, cycle) {
        Some(stats) => Quorum {
            eligible: match stats.total_eligible_voters {
                0 => counters::get(env, CounterKind::ActiveUsers),
                n => n,
            },
            needed: stats.quorum_votes_needed,
        },
        None => Quorum {
            eligible: counters::get(env, CounterKind::ActiveUsers),
            needed: 0,
        },
    }
}

/// Trailing average of voice cast, ending at `last`.
///
/// Falls back to half the eligible voters times 50 when `last` has no row.
pub fn quorum_base(env: &Env, cfg: &GovernanceConfig, last: u32) -> u64 {
    if storage::load_stats(env, last).is_none() {
        return counters::get(env, CounterKind::ActiveUsers) * 50 / 2;
    }
    let mut sum = 0u64;
    let mut rows = 0u64;
    let mut cycle = last;
    while rows < cfg.quorum_base_cycles as u64 {
        match storage::load_stats(env, cycle) {
            Some(stats) => {
                sum = sum.saturating_add(stats.total_voice_cast);
                rows += 1;
            }
            None => break,
        }
        if cycle == 0 {
            break;
        }
        cycle -= 1;
    }
    if rows == 0 {
        0
    } else {
        sum / rows
    }
}

fn votes_needed(cfg: &GovernanceConfig, base: u64, proposals: u32) -> u64 {
    base.saturating_mul(config::quorum_pct(cfg, proposals)) / 100
}

/// Close the current cycle and open the next. Returns the new cycle number.
pub fn on_period(env: &Env) -> Result<u32, Error> {
    let cfg = storage::get_config(env)?;
    let now = env.ledger().timestamp();
    let mut ctx = storage::get_cycle(env);
    let outgoing = ctx.cycle;
    let eligible = counters::get(env, CounterKind::ActiveUsers);

    if let Some(mut stats) = storage::load_stats(env, outgoing) {
        stats.total_eligible_voters = eligible;
        stats.end_time = now;
        storage::save_stats(env, &stats);
    }

    let active_proposals = counters::get(env, CounterKind::ActiveProposals);
    let base = quorum_base(env, &cfg, outgoing);

    ctx.cycle += 1;
    ctx.last_period = now;
    storage::set_cycle(env, &ctx);

    storage::save_stats(
        env,
        &CycleStats {
            cycle: ctx.cycle,
            start_time: now,
            end_time: 0,
            num_proposals: 0,
            num_votes: 0,
            total_voice_cast: 0,
            total_favour: 0,
            total_against: 0,
            total_citizens: counters::get(env, CounterKind::VoiceHolders),
            total_eligible_voters: eligible,
            quorum_vote_base: base,
            quorum_votes_needed: votes_needed(&cfg, base, 0),
            unity_needed_pct: cfg.majority_pct,
            active_props: Vec::new(env),
            eval_props: Vec::new(env),
        },
    );

    scheduler::enqueue(
        env,
        Task::Evaluate(EvalSweep {
            cycle: outgoing,
            phase: SweepPhase::Active,
            cursor: 0,
            active_upto: storage::index_end(env, Stage::Active),
            staged_upto: storage::index_end(env, Stage::Staged),
            chunk: cfg.batch_size,
        }),
        0,
    );
    scheduler::enqueue(
        env,
        Task::RefreshVoice(VoiceSweep {
            cursor: 0,
            chunk: cfg.batch_size,
        }),
        0,
    );
    scheduler::enqueue(
        env,
        Task::Reward(RewardSweep {
            cycle: outgoing,
            active_proposals,
            cursor: 0,
            chunk: cfg.batch_size,
        }),
        0,
    );

    events::cycle_advanced(
        env,
        CycleAdvanced {
            cycle: ctx.cycle,
            quorum_vote_base: base,
            eligible_voters: eligible,
            active_proposals,
        },
    );
    Ok(ctx.cycle)
}

// ── Evaluation ───────────────────────────────────────────────────────

/// Evaluate up to `chunk` index slots of the sweep's current phase.
///
/// Staged proposals are promoted regardless of eligible voters; active ones
/// need at least one, otherwise the chunk fails before touching anything.
pub fn evaluate_chunk(env: &Env, sweep: EvalSweep) -> Result<Option<EvalSweep>, Error> {
    let cfg = storage::get_config(env)?;
    let (stage, upto) = match sweep.phase {
        SweepPhase::Active => (Stage::Active, sweep.active_upto),
        SweepPhase::Staged => (Stage::Staged, sweep.staged_upto),
    };
    let page = storage::index_page(env, stage, sweep.cursor, upto, sweep.chunk);

    match sweep.phase {
        SweepPhase::Active => {
            let quorum = quorum_for(env, sweep.cycle);
            if quorum.eligible == 0 && !page.entries.is_empty() {
                return Err(Error::NoEligibleVoters);
            }
            for id in page.entries.iter() {
                if let Err(e) = evaluate_active(env, &cfg, &quorum, sweep.cycle, id) {
                    log!(env, "evaluation held", id, e as u32);
                    events::evaluation_held(env, id, e as u32);
                }
            }
        }
        SweepPhase::Staged => {
            for id in page.entries.iter() {
                promote_if_staked(env, &cfg, id)?;
            }
        }
    }
    log!(env, "evaluate chunk", sweep.cycle, page.entries.len());

    if let Some(cursor) = page.resume {
        return Ok(Some(EvalSweep { cursor, ..sweep }));
    }
    match sweep.phase {
        SweepPhase::Active => Ok(Some(EvalSweep {
            phase: SweepPhase::Staged,
            cursor: 0,
            ..sweep
        })),
        SweepPhase::Staged => Ok(None),
    }
}

fn majority_passes(cfg: &GovernanceConfig, state: &ProposalState) -> bool {
    let cast = state.favour as u128 + state.against as u128;
    state.favour > 0 && state.favour as u128 * 100 >= cast * cfg.majority_pct as u128
}

fn promote_if_staked(env: &Env, cfg: &GovernanceConfig, id: u64) -> Result<(), Error> {
    let terms = storage::load_terms(env, id)?;
    let mut state = storage::load_state(env, id)?;
    let required = config::min_stake(config::stake_rule(cfg, terms.fund.fund_type()), terms.quantity);
    if state.staked < required {
        return Ok(());
    }

    state.stage = Stage::Active;
    storage::save_state(env, id, &state);
    storage::index_move(env, id, Stage::Staged, Stage::Active);
    counters::change(env, CounterKind::ActiveProposals, 1);

    let cycle = storage::get_cycle(env).cycle;
    if let Some(mut stats) = storage::load_stats(env, cycle) {
        stats.active_props.push_back(id);
        stats.num_proposals += 1;
        stats.quorum_votes_needed = votes_needed(cfg, stats.quorum_vote_base, stats.num_proposals);
        storage::save_stats(env, &stats);
    }
    events::proposal_activated(env, id, cycle);
    Ok(())
}

/// `closed` is the cycle the votes were cast in.
fn evaluate_active(
    env: &Env,
    cfg: &GovernanceConfig,
    quorum: &Quorum,
    closed: u32,
    id: u64,
) -> Result<(), Error> {
    if !storage::has_proposal(env, id) {
        return Ok(());
    }
    let terms = storage::load_terms(env, id)?;
    let mut state = storage::load_state(env, id)?;

    let quorum_passes = match state.status {
        Status::Evaluate => true,
        Status::Open => state.favour >= quorum.needed,
        Status::Passed | Status::Rejected => return Ok(()),
    };

    if majority_passes(cfg, &state) && quorum_passes {
        approve(env, cfg, &terms, &mut state, closed)
    } else {
        reject(env, cfg, &terms, &mut state, closed)
    }
}

fn note_evaluated(env: &Env, id: u64) {
    let cycle = storage::get_cycle(env).cycle;
    if let Some(mut stats) = storage::load_stats(env, cycle) {
        stats.eval_props.push_back(id);
        storage::save_stats(env, &stats);
    }
}

fn approve(
    env: &Env,
    cfg: &GovernanceConfig,
    terms: &ProposalTerms,
    state: &mut ProposalState,
    closed: u32,
) -> Result<(), Error> {
    let id = terms.id;
    let cycle = storage::get_cycle(env).cycle;

    // Nothing may move before the slice is known to be payable.
    let age = match state.status {
        Status::Open => 0,
        _ => state.age + 1,
    };
    let due = proposals::payout_slice(&terms.schedule, terms.quantity, state.current_payout, age)?;
    if due > storage::fund_balance(env, terms.fund) {
        return Err(Error::FundExhausted);
    }

    if state.status == Status::Open {
        external::send(env, &terms.creator, state.staked)?;
        state.staked = 0;
        external::add_reputation(env, &terms.creator, cfg.pass_rep)?;
        state.age = 0;
        proposals::disburse(env, terms, state)?;
        state.status = Status::Evaluate;
        state.passed_cycle = closed;
        counters::change(env, CounterKind::ActiveProposals, -1);
        storage::save_state(env, id, state);
        note_evaluated(env, id);
        events::proposal_approved(env, id, cycle);
        return Ok(());
    }

    state.age += 1;
    proposals::disburse(env, terms, state)?;
    if state.age + 1 >= terms.schedule.len() {
        state.executed = true;
        state.status = Status::Passed;
        state.stage = Stage::Done;
        storage::save_state(env, id, state);
        storage::index_remove(env, Stage::Active, id);
        events::proposal_passed(env, id, cycle);
    } else {
        storage::save_state(env, id, state);
        note_evaluated(env, id);
    }
    Ok(())
}

fn reject(
    env: &Env,
    cfg: &GovernanceConfig,
    terms: &ProposalTerms,
    state: &mut ProposalState,
    closed: u32,
) -> Result<(), Error> {
    let id = terms.id;
    let mut burned = 0;
    match state.status {
        Status::Open => {
            external::burn(env, state.staked)?;
            burned = state.staked;
            state.staked = 0;
            state.passed_cycle = closed;
            counters::change(env, CounterKind::ActiveProposals, -1);
        }
        _ => external::punish(env, &terms.creator, cfg.reject_penalty)?,
    }
    if state.campaign_id != 0 {
        external::return_campaign_funds(env, state.campaign_id)?;
    }

    state.status = Status::Rejected;
    state.stage = Stage::Done;
    storage::save_state(env, id, state);
    storage::index_remove(env, Stage::Active, id);

    events::proposal_rejected(
        env,
        ProposalRejected {
            proposal_id: id,
            favour: state.favour,
            against: state.against,
            burned,
        },
    );
    Ok(())
}

// ── Participation rewards ────────────────────────────────────────────

/// Reward accounts that voted on every active proposal of the closed cycle
/// with at least one non-neutral vote, consuming that cycle's records.
pub fn reward_chunk(env: &Env, sweep: RewardSweep) -> Result<Option<RewardSweep>, Error> {
    let cfg = storage::get_config(env)?;
    let participants = Roster::Participants(sweep.cycle);
    let page = roster::page::<Address>(env, &participants, sweep.cursor, sweep.chunk);
    for account in page.entries.iter() {
        let key = DataKey::Participant(sweep.cycle, account.clone());
        if let Some(record) = storage::read::<Participant>(env, &key) {
            if record.non_neutral && record.count as u64 == sweep.active_proposals {
                external::add_reputation(env, &account, cfg.participation_rep)?;
            }
        }
        storage::remove(env, &key);
        roster::remove(env, &participants, &account);
    }

    match page.resume {
        Some(cursor) => Ok(Some(RewardSweep { cursor, ..sweep })),
        None => {
            roster::forget(env, &participants);
            Ok(None)
        }
    }
}

/// Count open proposals in the active stage and store the result.
pub fn recompute_active_count(env: &Env) -> u64 {
    let mut open = 0u64;
    let mut cursor = Some(0u64);
    while let Some(from) = cursor {
        let page = storage::index_page(env, Stage::Active, from, u64::MAX, RECOUNT_CHUNK);
        for id in page.entries.iter() {
            if let Ok(state) = storage::load_state(env, id) {
                if state.status == Status::Open {
                    open += 1;
                }
            }
        }
        cursor = page.resume;
    }
    counters::set(env, CounterKind::ActiveProposals, open);
    open
}
