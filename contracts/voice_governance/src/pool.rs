//! # Redemption pool
//!
//! Beneficiaries hold pooled balances. A payout round spreads `quantity`
//! over them in proportion to balance, in chunks. Shares are taken against
//! the pool total as it stood when the round began; the live total drops by
//! what each chunk pays. Every beneficiary is marked with the round that
//! paid it, so re-running a chunk from an earlier cursor pays nobody twice.

use soroban_sdk::{log, Address, Env};

use crate::events;
use crate::external;
use crate::roster::{self, Roster};
use crate::storage::{self, DataKey};
use crate::types::{PoolPayout, PoolRound};
use crate::Error;

pub fn balance(env: &Env, account: &Address) -> i128 {
    storage::read(env, &DataKey::PoolBalance(account.clone())).unwrap_or(0)
}

pub fn total(env: &Env) -> i128 {
    storage::read(env, &DataKey::PoolTotal).unwrap_or(0)
}

pub fn round(env: &Env) -> PoolRound {
    storage::read(env, &DataKey::PoolRound).unwrap_or_default()
}

fn set_balance(env: &Env, account: &Address, amount: i128) {
    let key = DataKey::PoolBalance(account.clone());
    if amount == 0 {
        storage::remove(env, &key);
        storage::remove(env, &DataKey::PoolPaid(account.clone()));
        roster::remove(env, &Roster::PoolBeneficiaries, account);
    } else {
        storage::write(env, &key, &amount);
        roster::insert(env, &Roster::PoolBeneficiaries, account);
    }
}

/// Move `amount` from `from` into the pool, credited to `beneficiary`.
pub fn deposit(env: &Env, from: &Address, beneficiary: &Address, amount: i128) -> Result<i128, Error> {
    if amount <= 0 {
        return Err(Error::InvalidQuantity);
    }
    external::receive(env, from, amount)?;
    let updated = balance(env, beneficiary).saturating_add(amount);
    set_balance(env, beneficiary, updated);
    storage::write(env, &DataKey::PoolTotal, &total(env).saturating_add(amount));
    Ok(updated)
}

/// `min(balance, balance * quantity / total)`.
pub fn share(balance: i128, quantity: i128, total: i128) -> i128 {
    if total <= 0 {
        return 0;
    }
    let proportional = balance
        .checked_mul(quantity)
        .map(|p| p / total)
        .unwrap_or(balance);
    proportional.min(balance)
}

/// Open a new payout round for `quantity` and return its first link.
pub fn start_payout(env: &Env, quantity: i128, chunk: u32) -> Result<PoolPayout, Error> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity);
    }
    let pool_total = total(env);
    if pool_total == 0 {
        return Err(Error::PoolEmpty);
    }
    let next = PoolRound {
        round: round(env).round + 1,
        quantity,
        total: pool_total,
    };
    storage::write(env, &DataKey::PoolRound, &next);
    Ok(PoolPayout {
        round: next.round,
        cursor: 0,
        chunk,
        accumulated: 0,
    })
}

/// Continue the current round from an explicit cursor.
pub fn resume_payout(
    env: &Env,
    cursor: u64,
    chunk: u32,
    accumulated: i128,
) -> Result<PoolPayout, Error> {
    let current = round(env);
    if current.round == 0 {
        return Err(Error::NoPayoutRound);
    }
    Ok(PoolPayout {
        round: current.round,
        cursor,
        chunk,
        accumulated,
    })
}

pub fn payout_chunk(env: &Env, payout: PoolPayout) -> Result<Option<PoolPayout>, Error> {
    let current = round(env);
    if current.round != payout.round {
        log!(env, "stale pool round", payout.round, current.round);
        return Ok(None);
    }
    let beneficiaries = Roster::PoolBeneficiaries;
    let page = roster::page::<Address>(env, &beneficiaries, payout.cursor, payout.chunk);
    let mut paid = 0i128;

    for account in page.entries.iter() {
        let paid_key = DataKey::PoolPaid(account.clone());
        if storage::read::<u64>(env, &paid_key) == Some(current.round) {
            continue;
        }
        let held = balance(env, &account);
        let amount = share(held, current.quantity, current.total);
        storage::write(env, &paid_key, &current.round);
        if amount == 0 {
            continue;
        }
        external::send(env, &account, amount)?;
        set_balance(env, &account, held - amount);
        paid += amount;
        events::pool_paid(env, &account, amount);
    }
    if paid > 0 {
        storage::write(env, &DataKey::PoolTotal, &(total(env) - paid).max(0));
    }
    let accumulated = payout.accumulated + paid;
    log!(env, "pool chunk", payout.cursor, accumulated);

    Ok(page.resume.map(|cursor| PoolPayout {
        cursor,
        accumulated,
        ..payout
    }))
}
