//! Scoped aggregate counters.
//!
//! Every counter is addressed by a [`CounterKind`] and a scope. Global
//! counters use [`GLOBAL`]; per-cycle counters use the cycle number.

use soroban_sdk::{contracttype, Env};

use crate::storage::{self, DataKey};

pub const GLOBAL: u64 = 0;

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CounterKind {
    /// Open proposals in the active stage.
    ActiveProposals,
    /// Accounts active within the inactivity window.
    ActiveUsers,
    /// Accounts holding a voice entry.
    VoiceHolders,
    /// Rank of active voice holders summed by the refresh sweep, per cycle.
    VotePower,
}

pub fn get_scoped(env: &Env, kind: CounterKind, scope: u64) -> u64 {
    storage::read(env, &DataKey::Counter(kind, scope)).unwrap_or(0)
}

pub fn get(env: &Env, kind: CounterKind) -> u64 {
    get_scoped(env, kind, GLOBAL)
}

pub fn set_scoped(env: &Env, kind: CounterKind, scope: u64, value: u64) {
    storage::write(env, &DataKey::Counter(kind, scope), &value);
}

pub fn set(env: &Env, kind: CounterKind, value: u64) {
    set_scoped(env, kind, GLOBAL, value);
}

/// Add `delta`, flooring at zero when negative.
pub fn change_scoped(env: &Env, kind: CounterKind, scope: u64, delta: i64) {
    let current = get_scoped(env, kind, scope);
    let next = if delta < 0 {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as u64)
    };
    set_scoped(env, kind, scope, next);
}

pub fn change(env: &Env, kind: CounterKind, delta: i64) {
    change_scoped(env, kind, GLOBAL, delta);
}
