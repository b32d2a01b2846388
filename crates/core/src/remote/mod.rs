// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote data store boundary.
//!
//! The core only needs table-scoped insert/update/select/delete keyed by a
//! field match. It reads nothing from the remote schema beyond `id`,
//! `updated_at` and configured alternate keys.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Facade /  │────►│ RemoteStore │────►│   Remote    │
//! │ Orchestrator│◄────│   (trait)   │◄────│   Tables    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```

mod memory;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use memory::MemoryRemote;

/// Error type for remote operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The remote answered and refused the operation.
    #[error("remote rejected operation: {0}")]
    Rejected(String),

    /// The connection failed mid-operation.
    #[error("transport error: {0}")]
    Transport(String),

    /// The operation did not complete in time.
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    /// No connection to the remote exists.
    #[error("remote is unreachable")]
    Offline,
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by [`RemoteStore`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// Equality match on one top-level field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchKey {
    pub field: String,
    pub value: String,
}

impl MatchKey {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        MatchKey { field: field.into(), value: value.into() }
    }

    /// Match on the primary id.
    pub fn id(value: impl Into<String>) -> Self {
        Self::new("id", value)
    }

    /// Whether a row's field equals the key's value.
    pub fn matches(&self, row: &Value) -> bool {
        row.get(&self.field).and_then(Value::as_str) == Some(self.value.as_str())
    }
}

/// Conjunction of equality matches; empty selects every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub eq: Vec<MatchKey>,
}

impl Filter {
    /// A filter matching every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds an equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.eq.push(MatchKey::new(field, value));
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.eq.iter().all(|key| key.matches(row))
    }
}

/// Table-scoped operations against the remote data store.
///
/// Every method resolves to the affected rows. Implementations must be
/// shareable across tasks; the orchestrator and the facade hold the same
/// handle.
pub trait RemoteStore: Send + Sync {
    /// Insert a record.
    fn insert(&self, table: &str, record: Value) -> RemoteFuture<'_, Vec<Value>>;

    /// Merge `patch` into every row matching `key`.
    fn update(&self, table: &str, patch: Value, key: MatchKey) -> RemoteFuture<'_, Vec<Value>>;

    /// Read every row matching `filter`.
    fn select(&self, table: &str, filter: Filter) -> RemoteFuture<'_, Vec<Value>>;

    /// Delete every row matching `key`.
    fn delete(&self, table: &str, key: MatchKey) -> RemoteFuture<'_, Vec<Value>>;
}

/// Bounds a remote call by `limit`, mapping expiry to [`RemoteError::Timeout`].
pub async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = RemoteResult<T>>,
) -> RemoteResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(RemoteError::Timeout(limit)),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
