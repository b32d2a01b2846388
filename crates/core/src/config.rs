// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tunables for replay and caching.
//!
//! Both structs deserialize with per-field defaults, so a host can embed them
//! as optional `[sync]` and `[cache]` sections of its own config file.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::record::VOLUNTEERS_TABLE;

/// Replay configuration for the offline queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Failed attempts after which an action is dropped (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff in milliseconds (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Timeout for a single remote call in milliseconds (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Tables whose records may be addressed by an externally assigned key
    /// when the primary id is unknown (default: volunteers → anonymous_volunteer_id).
    #[serde(default = "default_alternate_keys")]
    pub alternate_keys: BTreeMap<String, String>,
    /// Table receiving an audit row after each replayed action (default:
    /// "offline_sync"). Absent disables auditing.
    #[serde(default = "default_audit_table")]
    pub audit_table: Option<String>,
    /// Maximum dead letters kept; the oldest are dropped first (default: 100).
    #[serde(default = "default_dead_letter_capacity")]
    pub dead_letter_capacity: usize,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_alternate_keys() -> BTreeMap<String, String> {
    let mut keys = BTreeMap::new();
    keys.insert(VOLUNTEERS_TABLE.to_string(), "anonymous_volunteer_id".to_string());
    keys
}

fn default_audit_table() -> Option<String> {
    Some("offline_sync".to_string())
}

fn default_dead_letter_capacity() -> usize {
    100
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            alternate_keys: default_alternate_keys(),
            audit_table: default_audit_table(),
            dead_letter_capacity: default_dead_letter_capacity(),
        }
    }
}

impl SyncConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The alternate key field for a table, if it has one.
    pub fn alternate_key(&self, table: &str) -> Option<&str> {
        self.alternate_keys.get(table).map(String::as_str)
    }
}

/// Configuration for the read-through cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Total serialized size budget in bytes (default: 50 MiB).
    #[serde(default = "default_budget_bytes")]
    pub budget_bytes: u64,
    /// Lifetime of entries written without an explicit TTL (default: 24h).
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
}

fn default_budget_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { budget_bytes: default_budget_bytes(), default_ttl_secs: default_ttl_secs() }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
