// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::Context;
use crate::display::format_action;
use crate::error::Result;

/// Lists pending actions in replay order.
pub fn list(ctx: &Context, out: &mut impl Write) -> Result<()> {
    let actions = ctx.access.orchestrator().queue().actions();
    if actions.is_empty() {
        writeln!(out, "Queue is empty")?;
        return Ok(());
    }
    for action in &actions {
        writeln!(out, "{}", format_action(action))?;
    }
    Ok(())
}

/// Discards every pending action.
pub fn clear(ctx: &Context, out: &mut impl Write) -> Result<()> {
    let sync = ctx.access.orchestrator();
    let count = sync.queue().len();
    sync.clear_queue();
    writeln!(out, "Cleared {} queued action(s)", count)?;
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
