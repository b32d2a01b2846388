// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-aware data access.
//!
//! [`DataAccess`] is what the UI layer talks to. Every operation tries the
//! remote first. Failed writes are handed to the offline queue and failed
//! reads are answered from the cache, so callers never see a remote error.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::action::{ActionKind, Priority};
use crate::cache::cache_key;
use crate::error::{Error, Result};
use crate::id::new_id;
use crate::record::{Record, REQUESTS_TABLE};
use crate::remote::{with_timeout, Filter, RemoteError, RemoteResult};
use crate::replay::target_key;
use crate::sync::{DetailedStatus, DrainReport, SyncOrchestrator, SyncStatus};

/// Who is reading; decides which rows a read covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sees the requests they raised.
    Victim,
    /// Sees the requests assigned to them.
    Volunteer,
    /// Sees everything.
    #[default]
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Victim => "victim",
            Role::Volunteer => "volunteer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "victim" => Ok(Role::Victim),
            "volunteer" => Ok(Role::Volunteer),
            "admin" => Ok(Role::Admin),
            _ => Err(Error::InvalidRole(s.to_string())),
        }
    }
}

/// The reader's identity and role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadScope {
    pub owner_id: String,
    pub role: Role,
}

impl ReadScope {
    pub fn new(owner_id: impl Into<String>, role: Role) -> Self {
        ReadScope { owner_id: owner_id.into(), role }
    }

    /// Remote filter restricting `table` to the rows this reader may see.
    pub fn filter(&self, table: &str) -> Filter {
        if table != REQUESTS_TABLE {
            return Filter::all();
        }
        match self.role {
            Role::Victim => Filter::all().eq("anonymous_victim_id", self.owner_id.clone()),
            Role::Volunteer => Filter::all().eq("assigned_volunteer_id", self.owner_id.clone()),
            Role::Admin => Filter::all(),
        }
    }

    /// Cache key under which this reader's rows of `table` are kept.
    pub fn cache_key(&self, table: &str) -> String {
        cache_key(table, &self.owner_id)
    }
}

/// Result of a write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The remote applied the write and returned these rows.
    Committed(Vec<Value>),
    /// The write is queued for replay. `data` is the optimistic result.
    Queued { action_id: String, data: Vec<Value> },
    /// The write failed remotely and could not be queued.
    Rejected { data: Vec<Value> },
}

impl WriteOutcome {
    /// Rows to show the user, whether or not the write has landed.
    pub fn data(&self) -> &[Value] {
        match self {
            WriteOutcome::Committed(data)
            | WriteOutcome::Queued { data, .. }
            | WriteOutcome::Rejected { data } => data,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, WriteOutcome::Committed(_))
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, WriteOutcome::Queued { .. })
    }
}

/// Result of a read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// Rows just read from the remote.
    Fresh(Vec<Value>),
    /// Rows from the cache; empty when nothing was cached.
    Cached(Vec<Value>),
}

impl ReadOutcome {
    pub fn rows(&self) -> &[Value] {
        match self {
            ReadOutcome::Fresh(rows) | ReadOutcome::Cached(rows) => rows,
        }
    }

    pub fn into_rows(self) -> Vec<Value> {
        match self {
            ReadOutcome::Fresh(rows) | ReadOutcome::Cached(rows) => rows,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, ReadOutcome::Fresh(_))
    }
}

/// Remote-first data access with offline fallbacks.
pub struct DataAccess {
    sync: Arc<SyncOrchestrator>,
    owner_id: String,
}

impl DataAccess {
    /// Creates a facade attributing queued writes to `owner_id`.
    pub fn new(sync: Arc<SyncOrchestrator>, owner_id: impl Into<String>) -> Self {
        DataAccess { sync, owner_id: owner_id.into() }
    }

    pub fn orchestrator(&self) -> &Arc<SyncOrchestrator> {
        &self.sync
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub async fn insert(&self, table: &str, payload: Value, priority: Priority) -> WriteOutcome {
        self.write(table, ActionKind::Insert, payload, priority).await
    }

    pub async fn update(&self, table: &str, payload: Value, priority: Priority) -> WriteOutcome {
        self.write(table, ActionKind::Update, payload, priority).await
    }

    pub async fn delete(&self, table: &str, payload: Value, priority: Priority) -> WriteOutcome {
        self.write(table, ActionKind::Delete, payload, priority).await
    }

    /// Applies a write remotely, queuing it if the remote is unavailable.
    pub async fn write(
        &self,
        table: &str,
        action: ActionKind,
        payload: Value,
        priority: Priority,
    ) -> WriteOutcome {
        let parsed = Record::from_value(table, payload.clone())
            .and_then(|record| record.validate_identifiers().map(|()| record));
        let mut record = match parsed {
            Ok(record) => record,
            Err(e) => {
                warn!("rejecting {} on {}: {}", action, table, e);
                return WriteOutcome::Rejected { data: vec![payload] };
            }
        };

        match self.apply(table, action, &record).await {
            Ok(rows) => return WriteOutcome::Committed(rows),
            Err(e) => debug!("{} on {} not applied remotely ({}), queuing", action, table, e),
        }

        if action == ActionKind::Insert && record.id().is_none() {
            record.set_id(new_id());
        }
        let data = vec![record.to_value()];
        match self.sync.enqueue(table, action, record, &self.owner_id, priority) {
            Some(action_id) => WriteOutcome::Queued { action_id, data },
            None => WriteOutcome::Rejected { data },
        }
    }

    async fn apply(&self, table: &str, action: ActionKind, record: &Record) -> RemoteResult<Vec<Value>> {
        let remote = self.sync.remote();
        let timeout = self.sync.config().request_timeout();
        let data = record.to_value();
        match action {
            ActionKind::Insert => with_timeout(timeout, remote.insert(table, data)).await,
            ActionKind::Update | ActionKind::Delete => {
                let key = target_key(self.sync.config(), table, action, record).ok_or_else(|| {
                    RemoteError::Rejected(format!("{action} on {table} names no record"))
                })?;
                if action == ActionKind::Update {
                    with_timeout(timeout, remote.update(table, data, key)).await
                } else {
                    with_timeout(timeout, remote.delete(table, key)).await
                }
            }
        }
    }

    /// Reads the rows of `table` visible to `scope`.
    ///
    /// Fresh rows are written through to the cache. When the remote is
    /// unavailable the cached rows are returned instead.
    pub async fn read(&self, table: &str, scope: &ReadScope) -> ReadOutcome {
        let key = scope.cache_key(table);
        let timeout = self.sync.config().request_timeout();
        match with_timeout(timeout, self.sync.remote().select(table, scope.filter(table))).await {
            Ok(rows) => {
                self.sync.cache().set(&key, &Value::Array(rows.clone()), None);
                ReadOutcome::Fresh(rows)
            }
            Err(e) => {
                debug!("reading {} from cache: {}", table, e);
                let rows = match self.sync.cache().get(&key) {
                    Some(Value::Array(rows)) => rows,
                    _ => Vec::new(),
                };
                ReadOutcome::Cached(rows)
            }
        }
    }

    /// Searches the cached rows of `table` for `scope`.
    pub fn search_cached(&self, table: &str, scope: &ReadScope, term: &str) -> Vec<Value> {
        self.sync.cache().search(&scope.cache_key(table), term).unwrap_or_default()
    }

    pub fn status(&self) -> SyncStatus {
        self.sync.status()
    }

    pub fn detailed_status(&self) -> DetailedStatus {
        self.sync.detailed_status()
    }

    pub async fn sync_now(&self) -> DrainReport {
        self.sync.sync_now().await
    }
}

#[cfg(test)]
#[path = "facade_tests.rs"]
mod tests;
