// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync orchestration.
//!
//! [`SyncOrchestrator`] owns the offline queue, the cache and the remote
//! handle, tracks connectivity and replays the queue when the remote is
//! reachable. It is shared by `Arc` between the data access facade and the
//! event loop started with [`SyncOrchestrator::run`].
//!
//! A replay pass works on a snapshot of the queue:
//!
//! ```text
//! snapshot ──► replay each due action ──► finish_pass(survivors)
//!                 │
//!                 ├─ applied      → removed, audited
//!                 ├─ failed       → retry_count += 1, kept until max_retries
//!                 ├─ conflict     → dead-lettered
//!                 └─ unidentified → dead-lettered
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::action::{ActionKind, Priority, QueuedAction};
use crate::cache::CacheStore;
use crate::clock::{ClockSource, SystemClock};
use crate::config::{CacheConfig, SyncConfig};
use crate::error::Result;
use crate::queue::{DeadLetter, DropReason, OfflineQueue, PriorityCounts};
use crate::record::Record;
use crate::remote::{with_timeout, RemoteStore};
use crate::replay::{audit_row, replay, Replay};
use crate::store::LocalStore;

/// Tag under which background replay is registered.
pub const BACKGROUND_SYNC_TAG: &str = "relief-sync";

/// Host capability to replay the queue while the client is not running.
pub trait BackgroundSync: Send + Sync {
    /// Asks the host to schedule a replay under `tag`.
    fn register(&self, tag: &str) -> Result<()>;
}

/// Summary of one replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// The pass did not run: offline, or another pass was in progress.
    pub skipped: bool,
    pub applied: usize,
    /// Failed and kept for another attempt.
    pub retried: usize,
    /// Still inside their backoff window.
    pub deferred: usize,
    pub conflicts: usize,
    /// Dropped for exhausting retries or naming no record.
    pub dropped: usize,
}

impl DrainReport {
    fn skipped() -> Self {
        DrainReport { skipped: true, ..Default::default() }
    }

    /// Whether work remains queued after the pass.
    pub fn has_pending(&self) -> bool {
        self.retried > 0 || self.deferred > 0
    }
}

/// Connectivity and queue summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub online: bool,
    pub queue_length: usize,
    /// Admission time of the oldest pending action (ms since epoch).
    pub oldest_queued_at: Option<u64>,
    pub oldest_age_ms: Option<u64>,
}

/// [`SyncStatus`] plus queue breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedStatus {
    #[serde(flatten)]
    pub status: SyncStatus,
    pub priorities: PriorityCounts,
    /// Pending actions that have failed at least once.
    pub retrying: usize,
    pub dead_letters: usize,
}

/// Clears the draining flag when a pass ends, however it ends.
struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| DrainGuard(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Builder for [`SyncOrchestrator`].
pub struct SyncOrchestratorBuilder {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    clock: Arc<dyn ClockSource>,
    sync: SyncConfig,
    cache: CacheConfig,
    background: Option<Arc<dyn BackgroundSync>>,
}

impl SyncOrchestratorBuilder {
    pub fn clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn sync_config(mut self, config: SyncConfig) -> Self {
        self.sync = config;
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    pub fn background_sync(mut self, background: Arc<dyn BackgroundSync>) -> Self {
        self.background = Some(background);
        self
    }

    /// Loads the persisted queue and builds the orchestrator.
    pub fn build(self) -> SyncOrchestrator {
        let queue =
            OfflineQueue::load(self.store.clone(), self.clock.clone(), self.sync.dead_letter_capacity);
        let cache = CacheStore::new(self.store, self.clock.clone(), self.cache);
        SyncOrchestrator {
            queue,
            cache,
            remote: self.remote,
            clock: self.clock,
            config: self.sync,
            background: self.background,
            online: AtomicBool::new(true),
            draining: AtomicBool::new(false),
            drain_requested: Notify::new(),
        }
    }
}

/// Owns the offline queue and drives its replay.
pub struct SyncOrchestrator {
    queue: OfflineQueue,
    cache: CacheStore,
    remote: Arc<dyn RemoteStore>,
    clock: Arc<dyn ClockSource>,
    config: SyncConfig,
    background: Option<Arc<dyn BackgroundSync>>,
    online: AtomicBool,
    draining: AtomicBool,
    drain_requested: Notify,
}

impl SyncOrchestrator {
    /// Starts building an orchestrator over a local store and a remote.
    pub fn builder(store: Arc<dyn LocalStore>, remote: Arc<dyn RemoteStore>) -> SyncOrchestratorBuilder {
        SyncOrchestratorBuilder {
            store,
            remote,
            clock: Arc::new(SystemClock),
            sync: SyncConfig::default(),
            cache: CacheConfig::default(),
            background: None,
        }
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn remote(&self) -> &dyn RemoteStore {
        self.remote.as_ref()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn ClockSource {
        self.clock.as_ref()
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Whether a replay pass is in progress.
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// Records connectivity. Returns true when this is a transition to online.
    pub fn set_online(&self, online: bool) -> bool {
        let was = self.online.swap(online, Ordering::SeqCst);
        if was != online {
            info!("connectivity changed: {}", if online { "online" } else { "offline" });
        }
        online && !was
    }

    /// Records connectivity and replays the queue on a transition to online.
    pub async fn handle_connectivity(&self, online: bool) -> Option<DrainReport> {
        if self.set_online(online) {
            return Some(self.drain().await);
        }
        None
    }

    /// Admits an action to the queue and, when online, requests a replay.
    ///
    /// The request is served by [`SyncOrchestrator::run`]; callers without
    /// that loop call [`SyncOrchestrator::sync_now`] instead.
    ///
    /// Returns the queue id, or `None` if the payload was refused.
    pub fn enqueue(
        &self,
        table: &str,
        action: ActionKind,
        payload: Record,
        owner_id: &str,
        priority: Priority,
    ) -> Option<String> {
        let id = self.queue.enqueue(table, action, payload, owner_id, priority)?;
        if self.is_online() {
            self.drain_requested.notify_one();
        }
        Some(id)
    }

    /// Manually triggered replay.
    pub async fn sync_now(&self) -> DrainReport {
        debug!("manual sync requested");
        self.drain().await
    }

    /// Replays every due action once.
    ///
    /// Skipped when offline or when another pass is running.
    pub async fn drain(&self) -> DrainReport {
        if !self.is_online() {
            debug!("offline, not replaying queue");
            return DrainReport::skipped();
        }
        let Some(_guard) = DrainGuard::acquire(&self.draining) else {
            debug!("replay already in progress");
            return DrainReport::skipped();
        };

        let snapshot = self.queue.snapshot();
        if snapshot.actions.is_empty() {
            return DrainReport::default();
        }
        info!("replaying {} queued actions", snapshot.actions.len());

        let mut report = DrainReport::default();
        let mut survivors = Vec::new();
        let base = self.config.base_delay();

        for action in &snapshot.actions {
            if !action.is_due(self.clock.now_ms(), base) {
                debug!("action {} in backoff, skipping", action.id);
                report.deferred += 1;
                survivors.push(action.clone());
                continue;
            }

            match replay(self.remote.as_ref(), &self.config, action).await {
                Replay::Applied { record_id, data } => {
                    debug!("replayed {} on {} ({})", action.action, action.table, record_id);
                    report.applied += 1;
                    self.audit(action, &record_id, &data).await;
                }
                Replay::Conflict { remote_updated_at } => {
                    warn!(
                        "conflict on {}: remote updated at {} after local change at {}, discarding",
                        action.table, remote_updated_at, action.local_updated_at
                    );
                    report.conflicts += 1;
                    self.queue.dead_letter(action.clone(), DropReason::Conflict);
                }
                Replay::Unidentified => {
                    warn!("{} on {} names no record, discarding", action.action, action.table);
                    report.dropped += 1;
                    self.queue.dead_letter(action.clone(), DropReason::Unidentified);
                }
                Replay::Failed(e) => {
                    let mut failed = action.clone();
                    failed.record_failure(self.clock.now_ms());
                    if failed.retry_count >= self.config.max_retries {
                        error!(
                            "{} on {} failed {} times, discarding: {}",
                            failed.action, failed.table, failed.retry_count, e
                        );
                        report.dropped += 1;
                        self.queue.dead_letter(failed, DropReason::RetriesExhausted);
                    } else {
                        warn!(
                            "{} on {} failed (attempt {}): {}",
                            failed.action, failed.table, failed.retry_count, e
                        );
                        report.retried += 1;
                        survivors.push(failed);
                    }
                }
            }
        }

        self.queue.finish_pass(&snapshot, survivors);
        info!(
            "replay finished: {} applied, {} retrying, {} deferred, {} conflicts, {} dropped",
            report.applied, report.retried, report.deferred, report.conflicts, report.dropped
        );
        if report.has_pending() {
            self.register_background_sync();
        }
        report
    }

    async fn audit(&self, action: &QueuedAction, record_id: &str, data: &serde_json::Value) {
        let Some(table) = self.config.audit_table.as_deref() else {
            return;
        };
        let row = audit_row(action, record_id, data);
        let call = self.remote.insert(table, row);
        if let Err(e) = with_timeout(self.config.request_timeout(), call).await {
            debug!("failed to record sync audit row: {}", e);
        }
    }

    fn register_background_sync(&self) {
        let Some(background) = &self.background else {
            debug!("background sync not available");
            return;
        };
        if let Err(e) = background.register(BACKGROUND_SYNC_TAG) {
            warn!("failed to register background sync: {}", e);
        }
    }

    pub fn status(&self) -> SyncStatus {
        let oldest_queued_at = self.queue.oldest_created_at();
        SyncStatus {
            online: self.is_online(),
            queue_length: self.queue.len(),
            oldest_queued_at,
            oldest_age_ms: oldest_queued_at.map(|at| self.clock.now_ms().saturating_sub(at)),
        }
    }

    pub fn detailed_status(&self) -> DetailedStatus {
        DetailedStatus {
            status: self.status(),
            priorities: self.queue.priority_counts(),
            retrying: self.queue.retrying_count(),
            dead_letters: self.queue.dead_letter_count(),
        }
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.queue.dead_letters()
    }

    pub fn clear_dead_letters(&self) {
        self.queue.clear_dead_letters();
    }

    pub fn clear_queue(&self) {
        self.queue.clear();
    }

    /// Event loop: follows connectivity and serves replay requests.
    ///
    /// Returns when the connectivity sender is dropped.
    pub async fn run(self: Arc<Self>, mut connectivity: watch::Receiver<bool>) {
        let initial = *connectivity.borrow_and_update();
        self.set_online(initial);
        if initial {
            self.drain().await;
        }

        loop {
            tokio::select! {
                changed = connectivity.changed() => {
                    if changed.is_err() {
                        debug!("connectivity source closed, stopping sync loop");
                        break;
                    }
                    let online = *connectivity.borrow_and_update();
                    self.handle_connectivity(online).await;
                }
                _ = self.drain_requested.notified() => {
                    if self.is_online() {
                        self.drain().await;
                    }
                }
            }
        }
    }

    /// Spawns [`run`](Self::run) on the current runtime.
    pub fn spawn(self: &Arc<Self>, connectivity: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(connectivity))
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
