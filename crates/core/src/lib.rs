// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! relief-core: Offline durability and sync layer for relief clients
//!
//! This crate provides the local cache, the offline write queue, the sync
//! orchestrator and the offline-aware data access facade used by the relief
//! CLI, plus the remote store boundary and wire protocol shared with
//! relief-remote.

pub mod action;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod facade;
pub mod id;
pub mod protocol;
pub mod queue;
pub mod record;
pub mod remote;
pub mod replay;
pub mod store;
pub mod sync;

pub use action::{ActionKind, Priority, QueuedAction};
pub use cache::{cache_key, CacheStats, CacheStore};
pub use clock::{ClockSource, ManualClock, SystemClock};
pub use config::{CacheConfig, SyncConfig};
pub use error::{Error, Result};
pub use facade::{DataAccess, ReadOutcome, ReadScope, Role, WriteOutcome};
pub use queue::{DeadLetter, DropReason, OfflineQueue, PriorityCounts};
pub use record::Record;
pub use remote::{Filter, MatchKey, MemoryRemote, RemoteError, RemoteResult, RemoteStore};
pub use store::{LocalStore, MemoryStore, SqliteStore, StoreError};
pub use sync::{BackgroundSync, DetailedStatus, DrainReport, SyncOrchestrator, SyncStatus};
