// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::Context;
use crate::error::Result;

/// Prints cache usage against its budget.
pub fn stats(ctx: &Context, as_json: bool, out: &mut impl Write) -> Result<()> {
    let stats = ctx.access.orchestrator().cache().stats();
    if as_json {
        writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
        return Ok(());
    }
    writeln!(out, "Entries: {}", stats.entries)?;
    writeln!(
        out,
        "Size: {} of {} bytes ({}%)",
        stats.total_bytes, stats.budget_bytes, stats.usage_percent
    )?;
    Ok(())
}

/// Removes every cache entry. Queue state is untouched.
pub fn clear(ctx: &Context, out: &mut impl Write) -> Result<()> {
    let cache = ctx.access.orchestrator().cache();
    let entries = cache.stats().entries;
    cache.clear();
    writeln!(out, "Cleared {} cache entr{}", entries, if entries == 1 { "y" } else { "ies" })?;
    Ok(())
}

/// Prints the cached value under `key`, or the rows of `key` read as a table name.
pub fn get(ctx: &Context, key: &str, out: &mut impl Write) -> Result<()> {
    let cache = ctx.access.orchestrator().cache();
    let value = cache.get(key).or_else(|| cache.get(&ctx.scope().cache_key(key)));
    match value {
        Some(value) => writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?,
        None => writeln!(out, "Not cached: {}", key)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
