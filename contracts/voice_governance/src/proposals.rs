//! # Proposal store
//!
//! Creation, editing, cancellation and staking, plus the payout primitives
//! the cycle controller uses when a proposal is evaluated.
//!
//! Funds paid out to proposals are custodied by this contract per [`Fund`]
//! and topped up through `fund_deposit`. Stakes are custodied alongside
//! them and are either refunded on first approval or burned on rejection.

use soroban_sdk::{vec, Address, Env, Vec};

use crate::config;
use crate::counters::{self, CounterKind};
use crate::events::{self, PayoutSent, ProposalCancelled, ProposalCreated, StakeAdded};
use crate::external;
use crate::storage;
use crate::types::{
    CampaignKind, Fund, FundType, InviteTerms, ProposalState, ProposalTerms, ProposalText, Stage,
    Status,
};
use crate::Error;

const MIN_SCHEDULE_LEN: u32 = 4;
const MAX_SCHEDULE_LEN: u32 = 25;
const MAX_FIRST_SLICE: u32 = 25;

// ── Schedules ────────────────────────────────────────────────────────

pub fn default_schedule(env: &Env) -> Vec<u32> {
    vec![env, 25, 25, 25, 25]
}

pub fn invite_schedule(env: &Env) -> Vec<u32> {
    vec![env, 100, 0, 0, 0, 0, 0]
}

/// Length 4..=25, first slice at most 25 and slices summing to exactly 100.
pub fn validate_schedule(schedule: &Vec<u32>) -> Result<(), Error> {
    let len = schedule.len();
    if !(MIN_SCHEDULE_LEN..=MAX_SCHEDULE_LEN).contains(&len) {
        return Err(Error::InvalidSchedule);
    }
    if schedule.get_unchecked(0) > MAX_FIRST_SLICE {
        return Err(Error::InvalidSchedule);
    }
    let mut sum = 0u32;
    for pct in schedule.iter() {
        sum = sum.saturating_add(pct);
    }
    if sum != 100 {
        return Err(Error::InvalidSchedule);
    }
    Ok(())
}

/// Amount due at payout `age`. The last slice pays whatever rounding left over.
pub fn payout_slice(
    schedule: &Vec<u32>,
    quantity: i128,
    paid: i128,
    age: u32,
) -> Result<i128, Error> {
    let len = schedule.len();
    if age >= len {
        Ok(0)
    } else if age == len - 1 {
        quantity.checked_sub(paid).ok_or(Error::ArithmeticOverflow)
    } else {
        (schedule.get_unchecked(age) as i128)
            .checked_mul(quantity)
            .map(|v| v / 100)
            .ok_or(Error::ArithmeticOverflow)
    }
}

/// Positive and small enough that any schedule percentage of it fits.
fn check_quantity(quantity: i128) -> Result<(), Error> {
    if quantity <= 0 || quantity.checked_mul(100).is_none() {
        return Err(Error::InvalidQuantity);
    }
    Ok(())
}

// ── Creation & editing ───────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn insert(
    env: &Env,
    creator: &Address,
    recipient: &Address,
    quantity: i128,
    fund: Fund,
    campaign: CampaignKind,
    invite: Option<InviteTerms>,
    text: ProposalText,
    schedule: Vec<u32>,
) -> u64 {
    let id = storage::next_proposal_id(env);
    storage::save_terms(
        env,
        &ProposalTerms {
            id,
            creator: creator.clone(),
            recipient: recipient.clone(),
            quantity,
            fund,
            campaign,
            invite,
            created_at: env.ledger().timestamp(),
            text,
            schedule,
        },
    );
    storage::save_state(
        env,
        id,
        &ProposalState {
            staked: 0,
            current_payout: 0,
            favour: 0,
            against: 0,
            total: 0,
            status: Status::Open,
            stage: Stage::Staged,
            age: 0,
            passed_cycle: 0,
            executed: false,
            campaign_id: 0,
        },
    );
    storage::index_insert(env, Stage::Staged, id);
    storage::set_last_proposal(env, creator, id);

    events::proposal_created(
        env,
        ProposalCreated {
            proposal_id: id,
            creator: creator.clone(),
            recipient: recipient.clone(),
            quantity,
            fund,
        },
    );
    id
}

pub fn create(
    env: &Env,
    creator: &Address,
    recipient: &Address,
    quantity: i128,
    fund: Fund,
    text: ProposalText,
    schedule: Option<Vec<u32>>,
) -> Result<u64, Error> {
    external::require_resident(env, creator)?;
    check_quantity(quantity)?;
    if fund.fund_type() == FundType::Milestone
        && *recipient != external::milestone_recipient(env)?
    {
        return Err(Error::InvalidRecipient);
    }
    let schedule = schedule.unwrap_or_else(|| default_schedule(env));
    validate_schedule(&schedule)?;

    Ok(insert(
        env,
        creator,
        recipient,
        quantity,
        fund,
        CampaignKind::Ordinary,
        None,
        text,
        schedule,
    ))
}

pub fn create_invite(
    env: &Env,
    creator: &Address,
    recipient: &Address,
    quantity: i128,
    text: ProposalText,
    invite: InviteTerms,
) -> Result<u64, Error> {
    external::require_resident(env, creator)?;
    check_quantity(quantity)?;
    let cfg = storage::get_config(env)?;
    if invite.max_amount_per_invite <= 0
        || invite.planted < cfg.invite_min_planted
        || invite.reward <= 0
        || invite.reward > cfg.invite_max_reward
    {
        return Err(Error::InvalidInvite);
    }

    Ok(insert(
        env,
        creator,
        recipient,
        quantity,
        Fund::Campaigns,
        CampaignKind::Invite,
        Some(invite),
        text,
        invite_schedule(env),
    ))
}

/// Rewrite text and, optionally, the schedule while nobody has voted.
pub fn update(
    env: &Env,
    creator: &Address,
    id: u64,
    text: ProposalText,
    schedule: Option<Vec<u32>>,
) -> Result<(), Error> {
    let mut terms = storage::load_terms(env, id)?;
    let state = storage::load_state(env, id)?;
    if terms.creator != *creator {
        return Err(Error::NotAuthorized);
    }
    if state.favour != 0 || state.against != 0 {
        return Err(Error::HasVotes);
    }
    if terms.campaign == CampaignKind::Ordinary {
        if let Some(schedule) = schedule {
            validate_schedule(&schedule)?;
            terms.schedule = schedule;
        }
    }
    terms.text = text;
    storage::save_terms(env, &terms);
    events::proposal_updated(env, id, creator);
    Ok(())
}

/// Withdraw an open proposal and refund its stake.
pub fn cancel(env: &Env, creator: &Address, id: u64) -> Result<(), Error> {
    let terms = storage::load_terms(env, id)?;
    let state = storage::load_state(env, id)?;
    if terms.creator != *creator {
        return Err(Error::NotAuthorized);
    }
    if state.status != Status::Open {
        return Err(Error::ProposalNotOpen);
    }

    external::send(env, creator, state.staked)?;
    if state.stage == Stage::Active {
        counters::change(env, CounterKind::ActiveProposals, -1);
    }
    storage::index_remove(env, state.stage, id);
    storage::delete_proposal(env, id);

    events::proposal_cancelled(
        env,
        ProposalCancelled {
            proposal_id: id,
            creator: creator.clone(),
            refunded: state.staked,
        },
    );
    Ok(())
}

// ── Staking ──────────────────────────────────────────────────────────

/// Stake into `id`, or into the staker's latest proposal when `id` is `None`.
/// Returns the proposal's total stake.
pub fn stake(env: &Env, from: &Address, id: Option<u64>, amount: i128) -> Result<i128, Error> {
    if amount <= 0 {
        return Err(Error::InvalidQuantity);
    }
    let id = match id {
        Some(id) => id,
        None => storage::last_proposal(env, from).ok_or(Error::NoProposal)?,
    };
    let terms = storage::load_terms(env, id)?;
    let mut state = storage::load_state(env, id)?;
    if state.status != Status::Open {
        return Err(Error::ProposalNotOpen);
    }

    let cfg = storage::get_config(env)?;
    let rule = config::stake_rule(&cfg, terms.fund.fund_type());
    let total = state.staked.saturating_add(amount);
    if total > rule.cap {
        return Err(Error::StakeCapExceeded);
    }

    external::receive(env, from, amount)?;
    state.staked = total;
    storage::save_state(env, id, &state);

    events::stake_added(
        env,
        StakeAdded {
            proposal_id: id,
            staker: from.clone(),
            amount,
            total_staked: total,
        },
    );
    Ok(total)
}

pub fn min_stake(env: &Env, id: u64) -> Result<i128, Error> {
    let terms = storage::load_terms(env, id)?;
    let cfg = storage::get_config(env)?;
    Ok(config::min_stake(
        config::stake_rule(&cfg, terms.fund.fund_type()),
        terms.quantity,
    ))
}

pub fn check_stake(env: &Env, id: u64) -> Result<bool, Error> {
    let state = storage::load_state(env, id)?;
    Ok(state.staked >= min_stake(env, id)?)
}

// ── Fund custody & payouts ───────────────────────────────────────────

pub fn fund_deposit(env: &Env, from: &Address, fund: Fund, amount: i128) -> Result<i128, Error> {
    if amount <= 0 {
        return Err(Error::InvalidQuantity);
    }
    external::receive(env, from, amount)?;
    let balance = storage::fund_balance(env, fund).saturating_add(amount);
    storage::set_fund_balance(env, fund, balance);
    Ok(balance)
}

/// Pay the slice for `state.age` out of the proposal's fund.
///
/// Alliance payouts go to escrow; the first payout of an invite proposal
/// funds its campaign; everything else goes straight to the recipient.
pub fn disburse(env: &Env, terms: &ProposalTerms, state: &mut ProposalState) -> Result<(), Error> {
    let amount = payout_slice(&terms.schedule, terms.quantity, state.current_payout, state.age)?;
    let available = storage::fund_balance(env, terms.fund);
    if amount > available {
        return Err(Error::FundExhausted);
    }
    storage::set_fund_balance(env, terms.fund, available - amount);

    match (&terms.invite, terms.fund.fund_type()) {
        (_, FundType::Alliance) => {
            external::lock_in_escrow(env, &terms.recipient, amount, terms.text.title.clone())?;
        }
        (Some(invite), _) if state.campaign_id == 0 => {
            state.campaign_id = external::create_campaign(
                env,
                &terms.creator,
                invite.max_amount_per_invite,
                invite.planted,
                &terms.recipient,
                invite.reward,
                amount,
                terms.id,
            )?;
        }
        _ => external::send(env, &terms.recipient, amount)?,
    }
    state.current_payout += amount;

    events::payout_sent(
        env,
        PayoutSent {
            proposal_id: terms.id,
            recipient: terms.recipient.clone(),
            amount,
            age: state.age,
        },
    );
    Ok(())
}
