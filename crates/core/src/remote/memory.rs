// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-process remote store.
//!
//! Behaves like the hosted database as far as the core can observe: assigns
//! missing ids, stamps `updated_at` on every write and enforces unique ids.
//! Connectivity loss, injected failures and latency can be switched on to
//! exercise the offline paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::{Map, Value};

use super::{Filter, MatchKey, RemoteError, RemoteFuture, RemoteResult, RemoteStore};
use crate::clock::{to_rfc3339, ClockSource, SystemClock};
use crate::id::new_id;

/// Remote store held entirely in memory.
pub struct MemoryRemote {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    clock: Arc<dyn ClockSource>,
    offline: AtomicBool,
    failures: AtomicU32,
    latency: Mutex<Option<Duration>>,
    calls: Mutex<Vec<String>>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// Creates an empty remote stamping times from the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty remote stamping times from `clock`.
    pub fn with_clock(clock: Arc<dyn ClockSource>) -> Self {
        MemoryRemote {
            tables: Mutex::new(HashMap::new()),
            clock,
            offline: AtomicBool::new(false),
            failures: AtomicU32::new(0),
            latency: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes every call fail with [`RemoteError::Offline`] until cleared.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes the next `n` calls fail with [`RemoteError::Rejected`].
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Snapshot of a table's rows.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        lock(&self.tables).get(table).cloned().unwrap_or_default()
    }

    /// Finds a row by primary id.
    pub fn find(&self, table: &str, id: &str) -> Option<Value> {
        let key = MatchKey::id(id);
        lock(&self.tables).get(table)?.iter().find(|row| key.matches(row)).cloned()
    }

    /// Inserts a row verbatim, without stamping.
    pub fn seed(&self, table: &str, row: Value) {
        lock(&self.tables).entry(table.to_string()).or_default().push(row);
    }

    /// Overwrites one field of the row with the given id, without stamping.
    pub fn set_field(&self, table: &str, id: &str, field: &str, value: Value) {
        let key = MatchKey::id(id);
        if let Some(rows) = lock(&self.tables).get_mut(table) {
            for row in rows.iter_mut().filter(|row| key.matches(row)) {
                if let Some(obj) = row.as_object_mut() {
                    obj.insert(field.to_string(), value.clone());
                }
            }
        }
    }

    /// Calls received so far, as `"{op}:{table}"`.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Records the call and applies connectivity and failure injection.
    async fn begin(&self, op: &str, table: &str) -> RemoteResult<()> {
        lock(&self.calls).push(format!("{op}:{table}"));
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Offline);
        }
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(RemoteError::Rejected("injected failure".to_string()));
        }
        Ok(())
    }

    fn now(&self) -> Value {
        Value::String(to_rfc3339(self.clock.now_ms()))
    }

    fn apply_insert(&self, table: &str, record: Value) -> RemoteResult<Vec<Value>> {
        let Value::Object(mut row) = record else {
            return Err(RemoteError::Rejected("record must be an object".to_string()));
        };
        let id = match row.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => new_id(),
        };
        row.insert("id".to_string(), Value::String(id.clone()));
        let now = self.now();
        row.entry("created_at").or_insert_with(|| now.clone());
        row.insert("updated_at".to_string(), now);

        let mut tables = lock(&self.tables);
        let rows = tables.entry(table.to_string()).or_default();
        let key = MatchKey::id(&id);
        if rows.iter().any(|r| key.matches(r)) {
            return Err(RemoteError::Rejected(format!(
                "duplicate key value violates unique constraint on {table}.id: {id}"
            )));
        }
        let row = Value::Object(row);
        rows.push(row.clone());
        Ok(vec![row])
    }

    fn apply_update(&self, table: &str, patch: Value, key: &MatchKey) -> RemoteResult<Vec<Value>> {
        let Value::Object(patch) = patch else {
            return Err(RemoteError::Rejected("patch must be an object".to_string()));
        };
        let now = self.now();
        let mut tables = lock(&self.tables);
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| key.matches(row)) {
                if let Some(obj) = row.as_object_mut() {
                    merge(obj, &patch);
                    obj.insert("updated_at".to_string(), now.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    fn apply_select(&self, table: &str, filter: &Filter) -> Vec<Value> {
        lock(&self.tables)
            .get(table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default()
    }

    fn apply_delete(&self, table: &str, key: &MatchKey) -> Vec<Value> {
        let mut tables = lock(&self.tables);
        let Some(rows) = tables.get_mut(table) else {
            return Vec::new();
        };
        let (removed, kept): (Vec<Value>, Vec<Value>) =
            rows.drain(..).partition(|row| key.matches(row));
        *rows = kept;
        removed
    }
}

fn merge(row: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (field, value) in patch {
        row.insert(field.clone(), value.clone());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl RemoteStore for MemoryRemote {
    fn insert(&self, table: &str, record: Value) -> RemoteFuture<'_, Vec<Value>> {
        let table = table.to_string();
        Box::pin(async move {
            self.begin("insert", &table).await?;
            self.apply_insert(&table, record)
        })
    }

    fn update(&self, table: &str, patch: Value, key: MatchKey) -> RemoteFuture<'_, Vec<Value>> {
        let table = table.to_string();
        Box::pin(async move {
            self.begin("update", &table).await?;
            self.apply_update(&table, patch, &key)
        })
    }

    fn select(&self, table: &str, filter: Filter) -> RemoteFuture<'_, Vec<Value>> {
        let table = table.to_string();
        Box::pin(async move {
            self.begin("select", &table).await?;
            Ok(self.apply_select(&table, &filter))
        })
    }

    fn delete(&self, table: &str, key: MatchKey) -> RemoteFuture<'_, Vec<Value>> {
        let table = table.to_string();
        Box::pin(async move {
            self.begin("delete", &table).await?;
            Ok(self.apply_delete(&table, &key))
        })
    }
}
