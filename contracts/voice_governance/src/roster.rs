//! Slot-ordered indices.
//!
//! Entries get the next free slot number when inserted; removal leaves a
//! hole. Chunked sweeps walk slots in ascending order, so a slot number is a
//! stable resume cursor even when entries are removed mid-chain. Every slot
//! is its own ledger entry, so a sweep only ever touches the slots it visits.
//!
//! Accounts (voice holders, participants, delegators, pool beneficiaries)
//! and proposal ids (the stage index) share the same layout.

use soroban_sdk::{contracttype, Address, Env, IntoVal, TryFromVal, Val, Vec};

use crate::storage::{self, DataKey};
use crate::types::{Stage, VoiceScope};

/// Head compaction stops after this many holes; later removals carry on.
const MAX_HEAD_SKIP: u32 = 32;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Roster {
    VoiceHolders,
    /// Accounts that voted during a cycle.
    Participants(u32),
    PoolBeneficiaries,
    /// Delegators of one delegatee.
    Delegators(VoiceScope, Address),
    /// Proposal ids currently in a stage (staged and active only).
    Stage(Stage),
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RosterMeta {
    /// Lowest slot that may be occupied.
    pub head: u64,
    /// Next slot to hand out.
    pub next: u64,
    /// Occupied slots.
    pub len: u64,
}

/// A value a roster can index.
pub trait Entry: Clone + IntoVal<Env, Val> + TryFromVal<Env, Val> {
    fn pos_key(roster: &Roster, entry: &Self) -> DataKey;
}

impl Entry for Address {
    fn pos_key(roster: &Roster, entry: &Self) -> DataKey {
        DataKey::RosterPos(roster.clone(), entry.clone())
    }
}

impl Entry for u64 {
    fn pos_key(roster: &Roster, entry: &Self) -> DataKey {
        DataKey::RosterIdPos(roster.clone(), *entry)
    }
}

pub fn meta(env: &Env, roster: &Roster) -> RosterMeta {
    storage::read(env, &DataKey::RosterMeta(roster.clone())).unwrap_or_default()
}

fn save_meta(env: &Env, roster: &Roster, meta: &RosterMeta) {
    storage::write(env, &DataKey::RosterMeta(roster.clone()), meta);
}

fn slot_key(roster: &Roster, slot: u64) -> DataKey {
    DataKey::RosterSlot(roster.clone(), slot)
}

pub fn contains<T: Entry>(env: &Env, roster: &Roster, entry: &T) -> bool {
    env.storage().persistent().has(&T::pos_key(roster, entry))
}

pub fn is_empty(env: &Env, roster: &Roster) -> bool {
    meta(env, roster).len == 0
}

/// Returns `true` when the entry was not present before.
pub fn insert<T: Entry>(env: &Env, roster: &Roster, entry: &T) -> bool {
    if contains(env, roster, entry) {
        return false;
    }
    let mut m = meta(env, roster);
    let slot = m.next;
    m.next += 1;
    m.len += 1;
    storage::write(env, &slot_key(roster, slot), entry);
    storage::write(env, &T::pos_key(roster, entry), &slot);
    save_meta(env, roster, &m);
    true
}

/// Returns `true` when the entry was present.
pub fn remove<T: Entry>(env: &Env, roster: &Roster, entry: &T) -> bool {
    let pos_key = T::pos_key(roster, entry);
    let slot: u64 = match storage::read(env, &pos_key) {
        Some(slot) => slot,
        None => return false,
    };
    storage::remove(env, &pos_key);
    storage::remove(env, &slot_key(roster, slot));

    let mut m = meta(env, roster);
    m.len = m.len.saturating_sub(1);
    if m.len == 0 {
        m.head = m.next;
    } else if slot == m.head {
        let mut skipped = 0u32;
        while m.head < m.next
            && skipped < MAX_HEAD_SKIP
            && !env.storage().persistent().has(&slot_key(roster, m.head))
        {
            m.head += 1;
            skipped += 1;
        }
    }
    save_meta(env, roster, &m);
    true
}

pub fn at<T: Entry>(env: &Env, roster: &Roster, slot: u64) -> Option<T> {
    storage::read(env, &slot_key(roster, slot))
}

/// Drop the bookkeeping of a roster that has been emptied for good.
pub fn forget(env: &Env, roster: &Roster) {
    if is_empty(env, roster) {
        storage::remove(env, &DataKey::RosterMeta(roster.clone()));
    }
}

/// One chunk of a roster walk: the occupied slots visited within `chunk`
/// slot steps, and the cursor to resume from (`None` when exhausted).
pub struct Page<T: Entry> {
    pub entries: Vec<T>,
    pub resume: Option<u64>,
}

/// Walk from `cursor` up to the roster's current end.
pub fn page<T: Entry>(env: &Env, roster: &Roster, cursor: u64, chunk: u32) -> Page<T> {
    page_until(env, roster, cursor, u64::MAX, chunk)
}

/// Walk slots in `[max(cursor, head), min(upto, next))`.
pub fn page_until<T: Entry>(
    env: &Env,
    roster: &Roster,
    cursor: u64,
    upto: u64,
    chunk: u32,
) -> Page<T> {
    let m = meta(env, roster);
    let end = upto.min(m.next);
    let mut slot = cursor.max(m.head);
    let mut steps = 0u32;
    let mut entries = Vec::new(env);
    while slot < end && steps < chunk {
        if let Some(entry) = at::<T>(env, roster, slot) {
            entries.push_back(entry);
        }
        slot += 1;
        steps += 1;
    }
    Page {
        entries,
        resume: if slot < end { Some(slot) } else { None },
    }
}
