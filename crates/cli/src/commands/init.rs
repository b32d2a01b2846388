// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::Path;

use relief_core::id::new_id;
use relief_core::{Role, SqliteStore};

use crate::config::{db_path, init_relief_dir, Config, RemoteConfig};
use crate::error::Result;

/// Creates `.relief/` under `path` with a config and an empty local database.
///
/// Without `owner`, a fresh identifier is generated.
pub fn run(
    path: &Path,
    owner: Option<String>,
    role: Role,
    remote: Option<String>,
    out: &mut impl Write,
) -> Result<()> {
    let mut config = Config::new(owner.unwrap_or_else(new_id), role)?;
    if let Some(url) = remote {
        config.remote = Some(RemoteConfig::new(url)?);
    }

    let relief_dir = init_relief_dir(path, &config)?;
    SqliteStore::open(&db_path(&relief_dir))?;

    writeln!(out, "Initialized relief at {}", relief_dir.display())?;
    writeln!(out, "Owner: {}", config.owner_id)?;
    writeln!(out, "Role: {}", config.role)?;
    match config.remote_url() {
        Some(url) => writeln!(out, "Remote: {}", url)?,
        None => writeln!(out, "Remote: none (writes stay queued until one is configured)")?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
