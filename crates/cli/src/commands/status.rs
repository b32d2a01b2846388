// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::Context;
use crate::display::{format_dead_letter, format_report, format_status};
use crate::error::Result;

/// Prints connectivity and queue status.
pub fn run(ctx: &Context, as_json: bool, out: &mut impl Write) -> Result<()> {
    let status = ctx.access.detailed_status();
    if as_json {
        writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
        return Ok(());
    }
    for line in format_status(&status) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Replays the offline queue now.
pub async fn sync(ctx: &Context, out: &mut impl Write) -> Result<()> {
    let report = ctx.access.sync_now().await;
    writeln!(out, "{}", format_report(&report))?;
    let remaining = ctx.access.status().queue_length;
    if remaining > 0 {
        writeln!(out, "{} action(s) still queued", remaining)?;
    }
    Ok(())
}

/// Lists writes dropped from the queue, or clears the list.
pub fn dead_letters(ctx: &Context, clear: bool, out: &mut impl Write) -> Result<()> {
    let sync = ctx.access.orchestrator();
    if clear {
        let count = sync.queue().dead_letter_count();
        sync.clear_dead_letters();
        writeln!(out, "Cleared {} dead letter(s)", count)?;
        return Ok(());
    }

    let letters = sync.dead_letters();
    if letters.is_empty() {
        writeln!(out, "No dead letters")?;
        return Ok(());
    }
    for letter in &letters {
        writeln!(out, "{}", format_dead_letter(letter))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
