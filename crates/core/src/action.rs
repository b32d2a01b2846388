// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued mutations and their retry bookkeeping.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::Record;

/// Replay priority of a queued action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort weight; higher replays first.
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(Error::InvalidPriority(s.to_string())),
        }
    }
}

/// The kind of mutation a queued action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Insert,
    Update,
    Delete,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Insert => "insert",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "insert" => Ok(ActionKind::Insert),
            "update" => Ok(ActionKind::Update),
            "delete" => Ok(ActionKind::Delete),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

/// A mutation waiting to be applied to the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Queue-local identifier, distinct from the record's primary key.
    pub id: String,
    /// Target remote table.
    pub table: String,
    pub action: ActionKind,
    pub payload: Record,
    /// Admission time in milliseconds since Unix epoch.
    pub created_at: u64,
    /// Creation marker stamped at admission (RFC 3339). Never sent to the remote.
    pub local_created_at: String,
    /// Update marker stamped at admission (RFC 3339), compared against the
    /// remote's `updated_at` to detect lost conflicts. Never sent to the remote.
    pub local_updated_at: String,
    /// The local actor that produced the action.
    pub owner_id: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<u64>,
    /// Admission sequence number, keeps ordering stable within a priority.
    #[serde(default)]
    pub seq: u64,
}

impl QueuedAction {
    /// Delay that must pass after the last attempt before the next one.
    ///
    /// `base * 2^(retry_count - 1)`; zero for an action never attempted.
    pub fn backoff(&self, base: Duration) -> Duration {
        if self.retry_count == 0 {
            return Duration::ZERO;
        }
        let exp = (self.retry_count - 1).min(20);
        base.saturating_mul(1u32 << exp)
    }

    /// Whether the backoff window since the last attempt has elapsed.
    pub fn is_due(&self, now_ms: u64, base: Duration) -> bool {
        match self.last_attempt_at {
            None => true,
            Some(last) => {
                let waited = now_ms.saturating_sub(last);
                u128::from(waited) >= self.backoff(base).as_millis()
            }
        }
    }

    /// Records a failed replay attempt.
    pub fn record_failure(&mut self, now_ms: u64) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_attempt_at = Some(now_ms);
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
