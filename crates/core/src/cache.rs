// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read-through cache over the local store.
//!
//! Entries are JSON envelopes stored under a private key prefix so the cache
//! can share the local store with the offline queue and unrelated data. The
//! total serialized size of the cache's own entries is held under a budget by
//! evicting the oldest quarter of entries whenever a write would exceed it.
//!
//! Nothing here returns an error to the caller: storage failures and corrupt
//! entries are logged and degrade to a cache miss.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::clock::ClockSource;
use crate::config::CacheConfig;
use crate::store::{LocalStore, StoreResult};

/// Key prefix marking entries owned by the cache.
pub const CACHE_PREFIX: &str = "relief_cache_";

/// A stored snapshot of a remote read result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    /// Write time in milliseconds since Unix epoch.
    pub stored_at: u64,
    /// The entry is absent once now > expires_at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at.is_some_and(|at| now_ms > at)
    }
}

/// Cache usage summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_bytes: u64,
    pub entries: usize,
    pub budget_bytes: u64,
    /// Utilization rounded to the nearest percent.
    pub usage_percent: u64,
}

/// Builds the logical cache key for a table's rows as seen by one owner.
///
/// Table names never contain `:`, so distinct pairs never share a key.
pub fn cache_key(table: &str, owner_id: &str) -> String {
    format!("{table}:{owner_id}")
}

/// Key/value cache with per-entry expiry and a total size budget.
pub struct CacheStore {
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn ClockSource>,
    config: CacheConfig,
}

impl CacheStore {
    pub fn new(store: Arc<dyn LocalStore>, clock: Arc<dyn ClockSource>, config: CacheConfig) -> Self {
        CacheStore { store, clock, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Stores a value. Without a TTL the configured default lifetime applies.
    pub fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) {
        let now = self.clock.now_ms();
        let ttl = ttl.unwrap_or_else(|| self.config.default_ttl());
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let entry = CacheEntry {
            data: value.clone(),
            stored_at: now,
            expires_at: Some(now.saturating_add(ttl_ms)),
        };
        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                error!("failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };
        let full_key = format!("{CACHE_PREFIX}{key}");
        let size = serialized.len() as u64;

        // An existing entry under the same key is about to be replaced.
        let replaced = self.entry_size(&full_key);
        let projected = self.total_size().saturating_sub(replaced).saturating_add(size);
        if projected > self.config.budget_bytes {
            self.evict_oldest();
            let projected =
                self.total_size().saturating_sub(self.entry_size(&full_key)).saturating_add(size);
            if projected > self.config.budget_bytes {
                warn!(
                    "cache entry {} ({} bytes) does not fit the {} byte budget, dropping",
                    key, size, self.config.budget_bytes
                );
                return;
            }
        }

        if let Err(e) = self.store.set(&full_key, &serialized) {
            warn!("failed to cache {}: {}, evicting and retrying", key, e);
            self.evict_oldest();
            if let Err(e) = self.store.set(&full_key, &serialized) {
                error!("failed to cache {} after eviction: {}", key, e);
            }
        }
    }

    /// Returns the value if present and not expired.
    ///
    /// Expired and corrupt entries are deleted as a side effect.
    pub fn get(&self, key: &str) -> Option<Value> {
        let full_key = format!("{CACHE_PREFIX}{key}");
        let stored = match self.store.get(&full_key) {
            Ok(Some(s)) => s,
            Ok(None) => return None,
            Err(e) => {
                error!("failed to read cache entry {}: {}", key, e);
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_str(&stored) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("corrupt cache entry {}: {}, removing", key, e);
                self.remove(key);
                return None;
            }
        };
        if entry.is_expired(self.clock.now_ms()) {
            debug!("cache entry {} expired", key);
            self.remove(key);
            return None;
        }
        Some(entry.data)
    }

    /// Deletes an entry unconditionally.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(&format!("{CACHE_PREFIX}{key}")) {
            error!("failed to remove cache entry {}: {}", key, e);
        }
    }

    /// Deletes every entry owned by the cache, leaving other keys untouched.
    pub fn clear(&self) {
        let keys = match self.store.keys_with_prefix(CACHE_PREFIX) {
            Ok(keys) => keys,
            Err(e) => {
                error!("failed to list cache entries: {}", e);
                return;
            }
        };
        for key in keys {
            if let Err(e) = self.store.remove(&key) {
                error!("failed to remove cache entry {}: {}", key, e);
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let (total_bytes, entries) = match self.owned_entries() {
            Ok(entries) => (entries.iter().map(|(_, size, _)| size).sum(), entries.len()),
            Err(e) => {
                error!("failed to compute cache stats: {}", e);
                (0, 0)
            }
        };
        let budget_bytes = self.config.budget_bytes;
        let usage_percent = if budget_bytes == 0 {
            0
        } else {
            (total_bytes.saturating_mul(100) + budget_bytes / 2) / budget_bytes
        };
        CacheStats { total_bytes, entries, budget_bytes, usage_percent }
    }

    /// Filters a cached list of records on description, location and status.
    ///
    /// Returns `None` when nothing is cached under `key`; an empty term
    /// returns the cached list unchanged.
    pub fn search(&self, key: &str, term: &str) -> Option<Vec<Value>> {
        let rows = match self.get(key)? {
            Value::Array(rows) => rows,
            _ => return Some(Vec::new()),
        };
        if term.is_empty() {
            return Some(rows);
        }
        let needle = term.to_lowercase();
        let matches = |row: &Value| {
            ["description", "location", "status"].iter().any(|field| {
                row.get(*field)
                    .and_then(Value::as_str)
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
        };
        Some(rows.into_iter().filter(|row| matches(row)).collect())
    }

    fn entry_size(&self, full_key: &str) -> u64 {
        match self.store.get(full_key) {
            Ok(Some(s)) => s.len() as u64,
            _ => 0,
        }
    }

    fn total_size(&self) -> u64 {
        match self.owned_entries() {
            Ok(entries) => entries.iter().map(|(_, size, _)| size).sum(),
            Err(e) => {
                error!("failed to compute cache size: {}", e);
                0
            }
        }
    }

    /// Lists owned entries as (full key, serialized size, stored_at).
    ///
    /// Unparseable entries are removed and skipped.
    fn owned_entries(&self) -> StoreResult<Vec<(String, u64, u64)>> {
        let mut entries = Vec::new();
        for key in self.store.keys_with_prefix(CACHE_PREFIX)? {
            let Some(stored) = self.store.get(&key)? else {
                continue;
            };
            match serde_json::from_str::<CacheEntry>(&stored) {
                Ok(entry) => entries.push((key, stored.len() as u64, entry.stored_at)),
                Err(_) => {
                    warn!("removing corrupt cache entry {}", key);
                    self.store.remove(&key)?;
                }
            }
        }
        Ok(entries)
    }

    /// Removes the oldest ceil(25%) of owned entries by `stored_at`.
    fn evict_oldest(&self) {
        let mut entries = match self.owned_entries() {
            Ok(entries) => entries,
            Err(e) => {
                error!("failed to list cache entries for eviction: {}", e);
                return;
            }
        };
        entries.sort_by_key(|(_, _, stored_at)| *stored_at);
        let to_remove = entries.len().div_ceil(4);
        for (key, _, _) in entries.iter().take(to_remove) {
            if let Err(e) = self.store.remove(key) {
                error!("failed to evict cache entry {}: {}", key, e);
            }
        }
        debug!("evicted {} old cache entries", to_remove);
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
