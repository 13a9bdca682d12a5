//! # Continuation scheduler
//!
//! Unbounded batch work runs as a chain of bounded chunks. Each chunk is a
//! [`Task`] carrying its own resume cursor and accumulators; running it
//! returns the next link of the chain, which is appended to a durable FIFO
//! queue with a due time. `crank` is permissionless: any keeper may drive
//! the queue, and a task only ever runs once it is due.
//!
//! ```text
//! head ──► [id, due, task] ──► [id, due, task] ──► ... ◄── tail
//! ```
//!
//! Cancelled entries leave holes that `crank` steps over. A task whose chunk
//! fails is parked under its id instead of blocking the queue; `retry`
//! re-queues it once the cause is fixed.

use soroban_sdk::{contracttype, log, symbol_short, Env, Symbol};

use crate::cycle;
use crate::delegation;
use crate::events::{self, TaskStatus};
use crate::pool;
use crate::storage::{self, DataKey};
use crate::types::{PendingTask, Task};
use crate::voice;
use crate::Error;

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueueBounds {
    /// Oldest id that may still be pending.
    pub head: u64,
    /// Next id to hand out.
    pub tail: u64,
}

pub fn bounds(env: &Env) -> QueueBounds {
    storage::read(env, &DataKey::TaskQueue).unwrap_or_default()
}

fn save_bounds(env: &Env, bounds: &QueueBounds) {
    storage::write(env, &DataKey::TaskQueue, bounds);
}

pub fn pending(env: &Env, id: u64) -> Option<PendingTask> {
    storage::read(env, &DataKey::Task(id))
}

fn kind_of(task: &Task) -> Symbol {
    match task {
        Task::Evaluate(_) => symbol_short!("evaluate"),
        Task::RefreshVoice(_) => symbol_short!("refresh"),
        Task::DecayVoice(_) => symbol_short!("decay"),
        Task::Mimic(_) => symbol_short!("mimic"),
        Task::Reward(_) => symbol_short!("reward"),
        Task::PoolPayout(_) => symbol_short!("pool"),
    }
}

/// Append `task`, due `delay_secs` from now. Returns its id.
pub fn enqueue(env: &Env, task: Task, delay_secs: u64) -> u64 {
    let mut b = bounds(env);
    let id = b.tail;
    b.tail += 1;
    let kind = kind_of(&task);
    storage::write(
        env,
        &DataKey::Task(id),
        &PendingTask {
            id,
            due: env.ledger().timestamp().saturating_add(delay_secs),
            task,
        },
    );
    save_bounds(env, &b);
    events::task_logged(env, id, kind, TaskStatus::Queued);
    id
}

/// Append the next link of a chain after the configured delay.
pub fn enqueue_continuation(env: &Env, task: Task) -> Result<u64, Error> {
    let cfg = storage::get_config(env)?;
    Ok(enqueue(env, task, cfg.continuation_delay_secs))
}

pub fn cancel(env: &Env, id: u64) -> Result<(), Error> {
    let entry = pending(env, id).ok_or(Error::TaskNotFound)?;
    storage::remove(env, &DataKey::Task(id));
    events::task_logged(env, id, kind_of(&entry.task), TaskStatus::Cancelled);
    Ok(())
}

pub fn parked(env: &Env, id: u64) -> Option<PendingTask> {
    storage::read(env, &DataKey::Parked(id))
}

/// Move a parked task back onto the queue, due now. Returns its new id.
pub fn retry(env: &Env, id: u64) -> Result<u64, Error> {
    let entry = parked(env, id).ok_or(Error::TaskNotFound)?;
    storage::remove(env, &DataKey::Parked(id));
    Ok(enqueue(env, entry.task, 0))
}

fn chunk_of(task: &Task) -> u32 {
    match task {
        Task::Evaluate(t) => t.chunk,
        Task::RefreshVoice(t) | Task::DecayVoice(t) => t.chunk,
        Task::Mimic(t) => t.chunk,
        Task::Reward(t) => t.chunk,
        Task::PoolPayout(t) => t.chunk,
    }
}

/// Run one chunk and return the next link, if any.
pub fn execute(env: &Env, task: Task) -> Result<Option<Task>, Error> {
    if chunk_of(&task) == 0 {
        return Err(Error::InvalidChunkSize);
    }
    let next = match task {
        Task::Evaluate(t) => cycle::evaluate_chunk(env, t)?.map(Task::Evaluate),
        Task::RefreshVoice(t) => voice::refresh_chunk(env, t)?.map(Task::RefreshVoice),
        Task::DecayVoice(t) => voice::decay_chunk(env, t)?.map(Task::DecayVoice),
        Task::Mimic(t) => delegation::mimic_chunk(env, t)?.map(Task::Mimic),
        Task::Reward(t) => cycle::reward_chunk(env, t)?.map(Task::Reward),
        Task::PoolPayout(t) => pool::payout_chunk(env, t)?.map(Task::PoolPayout),
    };
    Ok(next)
}

/// Run a first chunk in the caller's invocation and queue the remainder.
/// Returns the id of the queued continuation.
pub fn run_inline(env: &Env, task: Task) -> Result<Option<u64>, Error> {
    match execute(env, task)? {
        Some(next) => Ok(Some(enqueue_continuation(env, next)?)),
        None => Ok(None),
    }
}

/// Run up to `max` due tasks from the head of the queue. Stops at the first
/// task that is not yet due. A failing task is parked and counted as run.
/// Returns the number of tasks run.
pub fn crank(env: &Env, max: u32) -> Result<u32, Error> {
    let now = env.ledger().timestamp();
    let mut ran = 0u32;
    loop {
        let mut b = bounds(env);
        if ran >= max || b.head >= b.tail {
            break;
        }
        let entry = match pending(env, b.head) {
            Some(entry) => entry,
            None => {
                b.head += 1;
                save_bounds(env, &b);
                continue;
            }
        };
        if entry.due > now {
            break;
        }

        storage::remove(env, &DataKey::Task(entry.id));
        b.head += 1;
        save_bounds(env, &b);

        let kind = kind_of(&entry.task);
        match execute(env, entry.task.clone()) {
            Ok(next) => {
                if let Some(next) = next {
                    enqueue_continuation(env, next)?;
                }
                events::task_logged(env, entry.id, kind, TaskStatus::Ran);
            }
            Err(e) => {
                log!(env, "task parked", entry.id, e as u32);
                storage::write(env, &DataKey::Parked(entry.id), &entry);
                events::task_logged(env, entry.id, kind, TaskStatus::Parked);
            }
        }
        ran += 1;
    }
    Ok(ran)
}
