// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for relief-core operations.

use thiserror::Error;

use crate::store::StoreError;

/// All possible errors that can occur in relief-core operations.
///
/// Public service operations (queue admission, cache access, drain) never
/// return these to their callers; they are logged and degraded instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid identifier in field '{field}': '{value}'\n  hint: identifiers must be hyphenated UUIDs")]
    InvalidIdentifier { field: String, value: String },

    #[error("payload for table '{0}' must be a JSON object")]
    PayloadNotObject(String),

    #[error("payload for table '{table}' has an invalid shape: {reason}")]
    PayloadShape { table: String, reason: String },

    #[error("invalid priority: '{0}'\n  hint: valid priorities are: high, medium, low")]
    InvalidPriority(String),

    #[error("invalid action: '{0}'\n  hint: valid actions are: insert, update, delete")]
    InvalidAction(String),

    #[error("invalid role: '{0}'\n  hint: valid roles are: victim, volunteer, admin")]
    InvalidRole(String),

    #[error("background sync unavailable: {0}")]
    BackgroundSync(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for relief-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
