//! Last-active timestamps. Every newly tracked account bumps the
//! `ActiveUsers` counter, which the cycle controller snapshots as the
//! eligible-voter count.

use soroban_sdk::{Address, Env};

use crate::config;
use crate::counters::{self, CounterKind};
use crate::storage::{self, DataKey};
use crate::types::GovernanceConfig;

pub fn last_active(env: &Env, account: &Address) -> Option<u64> {
    storage::read(env, &DataKey::LastActive(account.clone()))
}

pub fn is_active(env: &Env, cfg: &GovernanceConfig, account: &Address) -> bool {
    match last_active(env, account) {
        Some(at) => at.saturating_add(config::inactivity_secs(cfg)) >= env.ledger().timestamp(),
        None => false,
    }
}

/// Stamp `account` as active now. Returns `true` when it was not tracked before.
pub fn touch(env: &Env, account: &Address) -> bool {
    let is_new = last_active(env, account).is_none();
    storage::write(
        env,
        &DataKey::LastActive(account.clone()),
        &env.ledger().timestamp(),
    );
    if is_new {
        counters::change(env, CounterKind::ActiveUsers, 1);
    }
    is_new
}

pub fn clear(env: &Env, account: &Address) {
    if last_active(env, account).is_some() {
        storage::remove(env, &DataKey::LastActive(account.clone()));
        counters::change(env, CounterKind::ActiveUsers, -1);
    }
}
