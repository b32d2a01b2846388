// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in the reliefrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'relief init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("invalid owner id: '{0}'\n  hint: owner ids must be hyphenated UUIDs")]
    InvalidOwner(String),

    #[error("invalid remote URL '{0}'\n  hint: use ws://host:port or wss://host:port")]
    InvalidRemoteUrl(String),

    #[error("invalid record: {0}\n  hint: pass a JSON object, e.g. '{{\"description\": \"water\"}}'")]
    InvalidRecord(String),

    #[error("write to '{table}' was rejected\n  hint: identifier fields must be hyphenated UUIDs")]
    WriteRejected { table: String },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] relief_core::Error),

    #[error("storage error: {0}")]
    Store(#[from] relief_core::StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for reliefrs operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
