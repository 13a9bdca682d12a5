//! # Voice ledger
//!
//! One authoritative balance per `(account, scope)`. Grants and absolute
//! sets write both scopes together; votes debit the single scope of the
//! proposal being voted on. Holders are tracked in the `VoiceHolders`
//! roster so refresh and decay can walk them in chunks.
//!
//! Decay arithmetic is fixed point with 18 decimals.

use soroban_sdk::{log, Address, Env};

use crate::activity;
use crate::counters::{self, CounterKind};
use crate::events;
use crate::external;
use crate::roster::{self, Roster};
use crate::storage::{self, DataKey};
use crate::types::{CycleState, GovernanceConfig, VoiceScope, VoiceSweep};
use crate::Error;

const SCOPES: [VoiceScope; 2] = [VoiceScope::General, VoiceScope::Alliance];

const ONE: u128 = 1_000_000_000_000_000_000;

pub fn get(env: &Env, account: &Address, scope: VoiceScope) -> Option<u64> {
    storage::read(env, &DataKey::Voice(account.clone(), scope))
}

pub fn balance(env: &Env, account: &Address, scope: VoiceScope) -> u64 {
    get(env, account, scope).unwrap_or(0)
}

pub fn is_holder(env: &Env, account: &Address) -> bool {
    roster::contains(env, &Roster::VoiceHolders, account)
}

fn put(env: &Env, account: &Address, scope: VoiceScope, amount: u64) {
    storage::write(env, &DataKey::Voice(account.clone(), scope), &amount);
}

fn ensure_holder(env: &Env, account: &Address) {
    if roster::insert(env, &Roster::VoiceHolders, account) {
        counters::change(env, CounterKind::VoiceHolders, 1);
    }
}

/// Set both scopes to `amount`.
pub fn set(env: &Env, account: &Address, amount: u64) {
    ensure_holder(env, account);
    for scope in SCOPES {
        put(env, account, scope, amount);
    }
}

/// Add `amount` to both scopes.
pub fn grant(env: &Env, account: &Address, amount: u64) {
    ensure_holder(env, account);
    for scope in SCOPES {
        let current = balance(env, account, scope);
        put(env, account, scope, current.saturating_add(amount));
    }
}

/// Spend `amount` from one scope. Returns the balance before the debit.
pub fn debit(env: &Env, account: &Address, scope: VoiceScope, amount: u64) -> Result<u64, Error> {
    let before = get(env, account, scope).ok_or(Error::NoVoice)?;
    if amount > before {
        return Err(Error::InsufficientVoice);
    }
    put(env, account, scope, before - amount);
    Ok(before)
}

/// Drop every scope for `account` and stop tracking its activity.
pub fn erase(env: &Env, account: &Address) {
    for scope in SCOPES {
        storage::remove(env, &DataKey::Voice(account.clone(), scope));
    }
    if roster::remove(env, &Roster::VoiceHolders, account) {
        counters::change(env, CounterKind::VoiceHolders, -1);
    }
    activity::clear(env, account);
}

// ── Decay ────────────────────────────────────────────────────────────

/// `(1 - pct/100)^periods` scaled by 10^18.
pub fn decay_factor(pct: u32, periods: u64) -> u128 {
    let mut base = (100 - pct.min(100)) as u128 * ONE / 100;
    let mut result = ONE;
    let mut n = periods;
    while n > 0 {
        if n & 1 == 1 {
            result = result * base / ONE;
        }
        base = base * base / ONE;
        n >>= 1;
    }
    result
}

pub fn apply_factor(amount: u64, factor: u128) -> u64 {
    (amount as u128 * factor / ONE) as u64
}

/// Whole decay periods to apply when voice is recovered from rank.
pub fn decay_periods(cfg: &GovernanceConfig, ctx: &CycleState) -> u64 {
    let eligible_from = ctx.last_period.saturating_add(cfg.decay_grace_secs);
    if eligible_from >= ctx.last_decay {
        0
    } else {
        (ctx.last_decay - eligible_from) / cfg.decay_period_secs + 1
    }
}

/// Re-derive voice from rank, decayed for the periods the account missed.
pub fn recover(env: &Env, cfg: &GovernanceConfig, account: &Address) -> Result<u64, Error> {
    let rank = external::rank_of(env, account)?;
    let ctx = storage::get_cycle(env);
    let periods = decay_periods(cfg, &ctx);
    let amount = apply_factor(rank, decay_factor(cfg.decay_pct, periods));
    set(env, account, amount);
    Ok(amount)
}

/// Time gate for a decay pass. Records the decay time when open.
pub fn start_decay(env: &Env, cfg: &GovernanceConfig) -> Result<(), Error> {
    let now = env.ledger().timestamp();
    let mut ctx = storage::get_cycle(env);
    let open = ctx.last_period < now
        && now - ctx.last_period >= cfg.decay_grace_secs
        && now.saturating_sub(ctx.last_decay) >= cfg.decay_period_secs;
    if !open {
        return Err(Error::DecayNotDue);
    }
    ctx.last_decay = now;
    storage::set_cycle(env, &ctx);
    events::decay_started(env, now);
    Ok(())
}

/// Multiply each holder's balances by `(100 - decay_pct) / 100`.
pub fn decay_chunk(env: &Env, sweep: VoiceSweep) -> Result<Option<VoiceSweep>, Error> {
    let cfg = storage::get_config(env)?;
    let factor = decay_factor(cfg.decay_pct, 1);
    let page = roster::page::<Address>(env, &Roster::VoiceHolders, sweep.cursor, sweep.chunk);
    for account in page.entries.iter() {
        for scope in SCOPES {
            if let Some(current) = get(env, &account, scope) {
                put(env, &account, scope, apply_factor(current, factor));
            }
        }
    }
    log!(env, "decay chunk", sweep.cursor, page.entries.len());
    Ok(page.resume.map(|cursor| VoiceSweep {
        cursor,
        chunk: sweep.chunk,
    }))
}

/// Reset voice to rank and rebuild the active-user and vote-power counters.
pub fn refresh_chunk(env: &Env, sweep: VoiceSweep) -> Result<Option<VoiceSweep>, Error> {
    let cfg = storage::get_config(env)?;
    let cycle = storage::get_cycle(env).cycle as u64;
    if sweep.cursor == 0 {
        counters::set_scoped(env, CounterKind::VotePower, cycle, 0);
        counters::set(env, CounterKind::ActiveUsers, 0);
    }
    let page = roster::page::<Address>(env, &Roster::VoiceHolders, sweep.cursor, sweep.chunk);
    for account in page.entries.iter() {
        let rank = external::rank_of(env, &account)?;
        set(env, &account, rank);
        if activity::is_active(env, &cfg, &account) {
            counters::change_scoped(env, CounterKind::VotePower, cycle, rank as i64);
            counters::change(env, CounterKind::ActiveUsers, 1);
        }
    }
    log!(env, "refresh chunk", sweep.cursor, page.entries.len());
    Ok(page.resume.map(|cursor| VoiceSweep {
        cursor,
        chunk: sweep.chunk,
    }))
}
