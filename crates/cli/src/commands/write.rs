// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use relief_core::{ActionKind, Priority, WriteOutcome};
use serde_json::{json, Value};

use super::Context;
use crate::display::format_rows;
use crate::error::{Error, Result};

/// Inserts a record, or updates record `update` when given.
pub async fn run(
    ctx: &Context,
    table: &str,
    record: &str,
    update: Option<String>,
    priority: Priority,
    out: &mut impl Write,
) -> Result<()> {
    let mut payload: Value =
        serde_json::from_str(record).map_err(|e| Error::InvalidRecord(e.to_string()))?;
    let Some(fields) = payload.as_object_mut() else {
        return Err(Error::InvalidRecord("expected a JSON object".to_string()));
    };

    let action = match update {
        Some(id) => {
            fields.insert("id".to_string(), Value::String(id));
            ActionKind::Update
        }
        None => ActionKind::Insert,
    };

    let outcome = ctx.access.write(table, action, payload, priority).await;
    report(table, action, &outcome, out)?;
    replay_if_online(ctx, &outcome, out).await
}

/// Deletes record `id`.
pub async fn delete(
    ctx: &Context,
    table: &str,
    id: &str,
    priority: Priority,
    out: &mut impl Write,
) -> Result<()> {
    let outcome = ctx.access.delete(table, json!({ "id": id }), priority).await;
    report(table, ActionKind::Delete, &outcome, out)?;
    replay_if_online(ctx, &outcome, out).await
}

/// A write queued while online is replayed before the process exits.
///
/// The queue only wakes its background loop, which a one-shot command never runs.
async fn replay_if_online(ctx: &Context, outcome: &WriteOutcome, out: &mut impl Write) -> Result<()> {
    if !outcome.is_queued() || !ctx.access.orchestrator().is_online() {
        return Ok(());
    }
    let report = ctx.access.sync_now().await;
    if report.applied > 0 {
        writeln!(out, "synced {} queued action(s)", report.applied)?;
    }
    Ok(())
}

fn report(
    table: &str,
    action: ActionKind,
    outcome: &WriteOutcome,
    out: &mut impl Write,
) -> Result<()> {
    match outcome {
        WriteOutcome::Committed(rows) => {
            writeln!(out, "{} on {}: committed", action, table)?;
            for line in format_rows(rows) {
                writeln!(out, "  {}", line)?;
            }
        }
        WriteOutcome::Queued { action_id, data } => {
            writeln!(out, "{} on {}: queued as {} (will sync when online)", action, table, action_id)?;
            for line in format_rows(data) {
                writeln!(out, "  {}", line)?;
            }
        }
        WriteOutcome::Rejected { .. } => {
            return Err(Error::WriteRejected { table: table.to_string() });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "write_tests.rs"]
mod tests;
