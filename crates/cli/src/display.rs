// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde_json::Value;

use relief_core::{DeadLetter, DetailedStatus, DrainReport, QueuedAction};

/// Format a millisecond Unix timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{ms}ms"))
}

/// Format an age as the largest whole unit: `45s`, `12m`, `3h`, `2d`.
pub fn format_age(ms: u64) -> String {
    let secs = ms / 1000;
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86_399 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86_400),
    }
}

/// One compact JSON line per row.
pub fn format_rows(rows: &[Value]) -> Vec<String> {
    rows.iter().map(Value::to_string).collect()
}

/// Single-line summary of a replay pass.
pub fn format_report(report: &DrainReport) -> String {
    if report.skipped {
        return "Sync skipped: offline or already syncing".to_string();
    }
    format!(
        "Synced: {} applied, {} retrying, {} deferred, {} conflicts, {} dropped",
        report.applied, report.retried, report.deferred, report.conflicts, report.dropped
    )
}

/// Multi-line status block.
pub fn format_status(status: &DetailedStatus) -> Vec<String> {
    let summary = &status.status;
    let mut lines = vec![
        format!("Remote: {}", if summary.online { "online" } else { "offline" }),
        format!(
            "Queued: {} (high {}, medium {}, low {})",
            summary.queue_length,
            status.priorities.high,
            status.priorities.medium,
            status.priorities.low
        ),
    ];
    if let (Some(at), Some(age)) = (summary.oldest_queued_at, summary.oldest_age_ms) {
        lines.push(format!("Oldest: {} ({} ago)", format_timestamp(at), format_age(age)));
    }
    lines.push(format!("Retrying: {}", status.retrying));
    lines.push(format!("Dead letters: {}", status.dead_letters));
    lines
}

/// `<priority> <action> <table> <record> [retries]` line for a queued action.
pub fn format_action(action: &QueuedAction) -> String {
    let mut line = format!(
        "{:<6} {:<6} {} {}",
        action.priority.as_str(),
        action.action.as_str(),
        action.table,
        action.payload.id().unwrap_or("-")
    );
    if action.retry_count > 0 {
        line.push_str(&format!(" (failed {}x)", action.retry_count));
    }
    line
}

pub fn format_dead_letter(letter: &DeadLetter) -> String {
    format!(
        "{}  {}  {}",
        format_timestamp(letter.dropped_at),
        letter.reason,
        format_action(&letter.action)
    )
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
