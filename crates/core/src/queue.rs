// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent queue of mutations awaiting replay.
//!
//! The queue is kept in memory and written through to the local store as a
//! single JSON array after every mutation. Order is priority descending, then
//! admission sequence, so a replay pass can walk it front to back.
//!
//! Replay itself lives in the orchestrator. A pass takes a [`PassSnapshot`],
//! works on copies of the actions without holding the queue lock, and hands
//! the survivors back through [`OfflineQueue::finish_pass`]. Actions admitted
//! while the pass ran are untouched by the merge.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::action::{ActionKind, Priority, QueuedAction};
use crate::clock::{to_rfc3339, ClockSource};
use crate::id::new_id;
use crate::record::Record;
use crate::store::LocalStore;

/// Store key holding the pending actions.
pub const QUEUE_KEY: &str = "relief_offline_queue";
/// Store key holding dropped actions.
pub const DEAD_LETTER_KEY: &str = "relief_dead_letters";

/// Why an action was removed without being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The remote record changed after the action was queued.
    Conflict,
    /// The action failed on every allowed attempt.
    RetriesExhausted,
    /// An update carried neither a primary id nor an alternate key.
    Unidentified,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Conflict => "conflict",
            DropReason::RetriesExhausted => "retries_exhausted",
            DropReason::Unidentified => "unidentified",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dropped action kept for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub action: QueuedAction,
    pub reason: DropReason,
    /// Drop time in milliseconds since Unix epoch.
    pub dropped_at: u64,
}

/// Pending action counts per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Copy of the queue taken at the start of a replay pass.
#[derive(Debug, Clone)]
pub struct PassSnapshot {
    pub actions: Vec<QueuedAction>,
    generation: u64,
}

#[derive(Default)]
struct QueueState {
    actions: Vec<QueuedAction>,
    dead: Vec<DeadLetter>,
    next_seq: u64,
    /// Bumped by `clear` so an in-flight pass cannot resurrect its actions.
    generation: u64,
}

/// The offline write queue.
pub struct OfflineQueue {
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn ClockSource>,
    dead_letter_capacity: usize,
    state: Mutex<QueueState>,
}

impl OfflineQueue {
    /// Loads the queue and dead letters from the store.
    ///
    /// Unreadable state is logged and treated as empty. Persisted actions
    /// that carry malformed identifiers are purged.
    pub fn load(
        store: Arc<dyn LocalStore>,
        clock: Arc<dyn ClockSource>,
        dead_letter_capacity: usize,
    ) -> Self {
        let mut actions: Vec<QueuedAction> = read_list(store.as_ref(), QUEUE_KEY);
        let dead: Vec<DeadLetter> = read_list(store.as_ref(), DEAD_LETTER_KEY);
        sort_actions(&mut actions);
        let next_seq = actions.iter().map(|a| a.seq + 1).max().unwrap_or(0);

        let queue = OfflineQueue {
            store,
            clock,
            dead_letter_capacity,
            state: Mutex::new(QueueState { actions, dead, next_seq, generation: 0 }),
        };
        let purged = queue.purge_invalid();
        if purged > 0 {
            warn!("purged {} queued actions with invalid identifiers", purged);
        }
        debug!("loaded {} queued actions", queue.len());
        queue
    }

    /// Admits an action, returning its queue id.
    ///
    /// Payloads with malformed identifier fields are refused with a warning
    /// and `None`.
    pub fn enqueue(
        &self,
        table: &str,
        action: ActionKind,
        payload: Record,
        owner_id: &str,
        priority: Priority,
    ) -> Option<String> {
        if let Err(e) = payload.validate_identifiers() {
            warn!("refusing to queue {} on {}: {}", action, table, e);
            return None;
        }

        let now = self.clock.now_ms();
        let marker = to_rfc3339(now);
        let id = new_id();
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.actions.push(QueuedAction {
            id: id.clone(),
            table: table.to_string(),
            action,
            payload,
            created_at: now,
            local_created_at: marker.clone(),
            local_updated_at: marker,
            owner_id: owner_id.to_string(),
            priority,
            retry_count: 0,
            last_attempt_at: None,
            seq,
        });
        sort_actions(&mut state.actions);
        self.persist_actions(&state.actions);
        info!("queued {} on {} ({} priority) as {}", action, table, priority, id);
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.lock().actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().actions.is_empty()
    }

    /// The pending actions in replay order.
    pub fn actions(&self) -> Vec<QueuedAction> {
        self.lock().actions.clone()
    }

    /// Takes a copy of the queue for a replay pass.
    pub fn snapshot(&self) -> PassSnapshot {
        let state = self.lock();
        PassSnapshot { actions: state.actions.clone(), generation: state.generation }
    }

    /// Writes back the result of a replay pass.
    ///
    /// Every action in `snapshot` is replaced by its survivor in `survivors`,
    /// or removed if it has none. Actions admitted during the pass are kept.
    pub fn finish_pass(&self, snapshot: &PassSnapshot, survivors: Vec<QueuedAction>) {
        let taken: HashSet<&str> = snapshot.actions.iter().map(|a| a.id.as_str()).collect();
        let mut state = self.lock();
        state.actions.retain(|a| !taken.contains(a.id.as_str()));
        if state.generation == snapshot.generation {
            state.actions.extend(survivors);
        } else {
            debug!("queue cleared during replay, discarding {} survivors", survivors.len());
        }
        sort_actions(&mut state.actions);
        self.persist_actions(&state.actions);
    }

    /// Records a dropped action, evicting the oldest letters beyond capacity.
    pub fn dead_letter(&self, action: QueuedAction, reason: DropReason) {
        let dropped_at = self.clock.now_ms();
        let mut state = self.lock();
        state.dead.push(DeadLetter { action, reason, dropped_at });
        let excess = state.dead.len().saturating_sub(self.dead_letter_capacity);
        state.dead = state.dead.split_off(excess);
        self.persist(DEAD_LETTER_KEY, &state.dead);
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.lock().dead.clone()
    }

    pub fn dead_letter_count(&self) -> usize {
        self.lock().dead.len()
    }

    pub fn clear_dead_letters(&self) {
        let mut state = self.lock();
        state.dead.clear();
        self.persist(DEAD_LETTER_KEY, &state.dead);
    }

    /// Drops every pending action.
    pub fn clear(&self) {
        let mut state = self.lock();
        let dropped = state.actions.len();
        state.actions.clear();
        state.generation += 1;
        self.persist_actions(&state.actions);
        info!("cleared {} queued actions", dropped);
    }

    /// Removes pending actions whose payload fails identifier validation.
    ///
    /// Returns how many were removed.
    pub fn purge_invalid(&self) -> usize {
        let mut state = self.lock();
        let before = state.actions.len();
        state.actions.retain(|a| match a.payload.validate_identifiers() {
            Ok(()) => true,
            Err(e) => {
                warn!("dropping queued action {}: {}", a.id, e);
                false
            }
        });
        let purged = before - state.actions.len();
        if purged > 0 {
            self.persist_actions(&state.actions);
        }
        purged
    }

    pub fn priority_counts(&self) -> PriorityCounts {
        let state = self.lock();
        let mut counts = PriorityCounts::default();
        for action in &state.actions {
            match action.priority {
                Priority::High => counts.high += 1,
                Priority::Medium => counts.medium += 1,
                Priority::Low => counts.low += 1,
            }
        }
        counts
    }

    /// Number of pending actions that have failed at least once.
    pub fn retrying_count(&self) -> usize {
        self.lock().actions.iter().filter(|a| a.retry_count > 0).count()
    }

    /// Admission time of the oldest pending action.
    pub fn oldest_created_at(&self) -> Option<u64> {
        self.lock().actions.iter().map(|a| a.created_at).min()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist_actions(&self, actions: &[QueuedAction]) {
        self.persist(QUEUE_KEY, actions);
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                error!("failed to serialize {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.set(key, &json) {
            error!("failed to persist {}: {}", key, e);
        }
    }
}

fn sort_actions(actions: &mut [QueuedAction]) {
    actions.sort_by(|a, b| {
        b.priority.weight().cmp(&a.priority.weight()).then(a.seq.cmp(&b.seq))
    });
}

fn read_list<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Vec<T> {
    let stored = match store.get(key) {
        Ok(Some(stored)) => stored,
        Ok(None) => return Vec::new(),
        Err(e) => {
            error!("failed to read {}: {}", key, e);
            return Vec::new();
        }
    };
    match serde_json::from_str(&stored) {
        Ok(list) => list,
        Err(e) => {
            warn!("ignoring unreadable {}: {}", key, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
