// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Applies one queued action to the remote store.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::action::{ActionKind, QueuedAction};
use crate::clock::parse_rfc3339;
use crate::config::SyncConfig;
use crate::record::Record;
use crate::remote::{with_timeout, Filter, MatchKey, RemoteError, RemoteStore};

/// How a replay attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Replay {
    /// The remote accepted the action.
    Applied { record_id: String, data: Value },
    /// The remote record is newer than the queued update.
    Conflict { remote_updated_at: String },
    /// The action names no record to act on.
    Unidentified,
    /// The call failed and may be retried.
    Failed(RemoteError),
}

/// Replays `action` against `remote`, bounding each call by the configured timeout.
pub async fn replay(remote: &dyn RemoteStore, config: &SyncConfig, action: &QueuedAction) -> Replay {
    let data = action.payload.to_value();
    let timeout = config.request_timeout();
    let table = action.table.as_str();

    let key = match action.action {
        ActionKind::Insert => {
            return match with_timeout(timeout, remote.insert(table, data.clone())).await {
                Ok(rows) => {
                    let record_id = action
                        .payload
                        .id()
                        .map(str::to_string)
                        .or_else(|| first_id(&rows))
                        .unwrap_or_else(|| action.id.clone());
                    Replay::Applied { record_id, data }
                }
                Err(e) => Replay::Failed(e),
            };
        }
        ActionKind::Update | ActionKind::Delete => {
            match target_key(config, table, action.action, &action.payload) {
                Some(key) => key,
                None => return Replay::Unidentified,
            }
        }
    };

    if action.action == ActionKind::Delete {
        return match with_timeout(timeout, remote.delete(table, key.clone())).await {
            Ok(_) => Replay::Applied { record_id: key.value, data },
            Err(e) => Replay::Failed(e),
        };
    }

    // Records addressed by an alternate key have no known primary id to check.
    if key.field == "id" {
        let filter = Filter::all().eq("id", key.value.clone());
        match with_timeout(timeout, remote.select(table, filter)).await {
            Ok(rows) => {
                if let Some(remote_updated_at) = newer_remote_version(&rows, &action.local_updated_at) {
                    return Replay::Conflict { remote_updated_at };
                }
            }
            Err(e) => return Replay::Failed(e),
        }
    }

    match with_timeout(timeout, remote.update(table, data.clone(), key.clone())).await {
        Ok(_) => Replay::Applied { record_id: key.value, data },
        Err(e) => Replay::Failed(e),
    }
}

/// The match key addressing the action's target record.
///
/// Updates fall back to the table's alternate key when the primary id is
/// unknown; deletes always need the primary id.
pub(crate) fn target_key(
    config: &SyncConfig,
    table: &str,
    action: ActionKind,
    payload: &Record,
) -> Option<MatchKey> {
    if let Some(id) = payload.id() {
        return Some(MatchKey::id(id));
    }
    if action != ActionKind::Update {
        return None;
    }
    let field = config.alternate_key(table)?;
    let value = payload.str_field(field)?;
    debug!("addressing {} update by {}", table, field);
    Some(MatchKey::new(field, value))
}

/// Returns the remote `updated_at` if it is strictly newer than the local marker.
///
/// A missing row or an unparseable timestamp on either side is not a conflict.
fn newer_remote_version(rows: &[Value], local_updated_at: &str) -> Option<String> {
    let remote_updated_at = rows.first()?.get("updated_at")?.as_str()?;
    let Some(remote_ms) = parse_rfc3339(remote_updated_at) else {
        warn!("unparseable remote updated_at '{}', applying update", remote_updated_at);
        return None;
    };
    let local_ms = parse_rfc3339(local_updated_at)?;
    (remote_ms > local_ms).then(|| remote_updated_at.to_string())
}

fn first_id(rows: &[Value]) -> Option<String> {
    rows.first()?.get("id")?.as_str().map(str::to_string)
}

/// Builds the audit row recorded after a successful replay.
pub fn audit_row(action: &QueuedAction, record_id: &str, data: &Value) -> Value {
    json!({
        "owner_id": action.owner_id,
        "table_name": action.table,
        "record_id": record_id,
        "action": action.action.as_str(),
        "data": data,
        "synced": true,
    })
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
