// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use relief_core::ReadOutcome;
use serde_json::json;

use super::Context;
use crate::display::format_rows;
use crate::error::Result;

/// Reads the rows of `table` visible to the configured owner and role.
pub async fn run(ctx: &Context, table: &str, as_json: bool, out: &mut impl Write) -> Result<()> {
    let outcome = ctx.access.read(table, &ctx.scope()).await;
    let source = if outcome.is_fresh() { "remote" } else { "cache" };

    if as_json {
        let body = json!({ "source": source, "rows": outcome.rows() });
        writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
        return Ok(());
    }

    match &outcome {
        ReadOutcome::Fresh(rows) => writeln!(out, "{} row(s) from remote", rows.len())?,
        ReadOutcome::Cached(rows) => writeln!(out, "{} row(s) from cache (offline)", rows.len())?,
    }
    for line in format_rows(outcome.rows()) {
        writeln!(out, "  {}", line)?;
    }
    Ok(())
}

/// Searches the cached rows of `table` for `term`.
pub fn search(ctx: &Context, table: &str, term: &str, out: &mut impl Write) -> Result<()> {
    let rows = ctx.access.search_cached(table, &ctx.scope(), term);
    if rows.is_empty() {
        writeln!(out, "No cached {} match '{}'", table, term)?;
        return Ok(());
    }
    for line in format_rows(&rows) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "read_tests.rs"]
mod tests;
