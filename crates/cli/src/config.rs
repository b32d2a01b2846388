// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is stored in `.relief/config.toml` and includes:
//! - `owner_id`: the local actor recorded on every queued write
//! - `role`: victim, volunteer or admin; decides which rows reads cover
//! - `[remote]`: optional relief-remote URL (absent means offline only)
//! - `[sync]` and `[cache]`: replay and cache tunables
//!
//! Local state (cache, queue, dead letters) lives in `.relief/local.db`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use relief_core::id::is_valid_uuid;
use relief_core::{CacheConfig, Role, SyncConfig};

use crate::error::{Error, Result};

const RELIEF_DIR_NAME: &str = ".relief";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "local.db";
const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Client configuration stored in `.relief/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The local actor; a hyphenated UUID.
    pub owner_id: String,
    #[serde(default)]
    pub role: Role,
    /// Remote server (optional - if absent, every write queues and reads hit the cache).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Remote server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket URL of relief-remote (`ws://...` or `wss://...`).
    pub url: String,
    /// Max time to wait for the connection in seconds (default: 2).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    2
}

impl RemoteConfig {
    /// Creates a remote config, validating the URL scheme.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(Error::InvalidRemoteUrl(url));
        }
        Ok(RemoteConfig { url, connect_timeout_secs: default_connect_timeout_secs() })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Config {
    /// Creates a config for `owner_id` with default tunables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOwner`] if `owner_id` is not a hyphenated UUID.
    pub fn new(owner_id: impl Into<String>, role: Role) -> Result<Self> {
        let owner_id = owner_id.into();
        if !is_valid_uuid(&owner_id) {
            return Err(Error::InvalidOwner(owner_id));
        }
        Ok(Config {
            owner_id,
            role,
            remote: None,
            sync: SyncConfig::default(),
            cache: CacheConfig::default(),
        })
    }

    /// Loads configuration from the given `.relief/` directory.
    pub fn load(relief_dir: &Path) -> Result<Self> {
        let config_path = relief_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        if !is_valid_uuid(&config.owner_id) {
            return Err(Error::InvalidOwner(config.owner_id));
        }
        Ok(config)
    }

    /// Returns the remote URL if configured.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.url.as_str())
    }

    /// Saves configuration to the given `.relief/` directory.
    pub fn save(&self, relief_dir: &Path) -> Result<()> {
        let config_path = relief_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }
}

/// Find the .relief directory by walking up from the current directory
pub fn find_relief_dir() -> Result<PathBuf> {
    find_relief_dir_from(&std::env::current_dir()?)
}

/// Find the .relief directory by walking up from `start`
pub fn find_relief_dir_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let relief_dir = current.join(RELIEF_DIR_NAME);
        if relief_dir.join(CONFIG_FILE_NAME).is_file() {
            return Ok(relief_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Path of the local state database inside a `.relief/` directory.
pub fn db_path(relief_dir: &Path) -> PathBuf {
    relief_dir.join(DB_FILE_NAME)
}

/// Initialize a new .relief directory at the given path.
///
/// An existing `.relief/` without a config file is reused.
pub fn init_relief_dir(path: &Path, config: &Config) -> Result<PathBuf> {
    let relief_dir = path.join(RELIEF_DIR_NAME);

    if relief_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::AlreadyInitialized(relief_dir.display().to_string()));
    }

    fs::create_dir_all(&relief_dir)?;
    config.save(&relief_dir)?;
    fs::write(
        relief_dir.join(GITIGNORE_FILE_NAME),
        "# Local cache and offline queue\nlocal.db\nlocal.db-*\n",
    )?;

    Ok(relief_dir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
