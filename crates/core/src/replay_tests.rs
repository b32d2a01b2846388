// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::action::Priority;
use crate::clock::{to_rfc3339, ManualClock};
use crate::record::Record;
use crate::remote::MemoryRemote;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use yare::parameterized;

const ID: &str = "550e8400-e29b-41d4-a716-446655440000";
const QUEUED_AT: u64 = 1_700_000_000_000;

fn action(table: &str, kind: ActionKind, payload: Value) -> QueuedAction {
    QueuedAction {
        id: "q1".to_string(),
        table: table.to_string(),
        action: kind,
        payload: Record::from_value(table, payload).unwrap(),
        created_at: QUEUED_AT,
        local_created_at: to_rfc3339(QUEUED_AT),
        local_updated_at: to_rfc3339(QUEUED_AT),
        owner_id: "owner".to_string(),
        priority: Priority::Medium,
        retry_count: 0,
        last_attempt_at: None,
        seq: 0,
    }
}

fn remote_at(ms: u64) -> (MemoryRemote, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(ms));
    (MemoryRemote::with_clock(clock.clone()), clock)
}

#[tokio::test]
async fn insert_sends_payload_without_markers() {
    let (remote, _) = remote_at(QUEUED_AT);
    let queued = action("requests", ActionKind::Insert, json!({"id": ID, "description": "water"}));

    let outcome = replay(&remote, &SyncConfig::default(), &queued).await;

    assert_eq!(
        outcome,
        Replay::Applied { record_id: ID.to_string(), data: json!({"id": ID, "description": "water"}) }
    );
    let row = remote.find("requests", ID).unwrap();
    assert!(row.get("local_updated_at").is_none());
    assert!(row.get("local_created_at").is_none());
}

#[tokio::test]
async fn insert_without_id_reports_remote_id() {
    let (remote, _) = remote_at(QUEUED_AT);
    let queued = action("messages", ActionKind::Insert, json!({"content": "hi"}));

    let outcome = replay(&remote, &SyncConfig::default(), &queued).await;

    let stored_id = remote.rows("messages")[0]["id"].clone();
    assert!(matches!(&outcome, Replay::Applied { record_id, .. } if json!(record_id) == stored_id));
}

#[tokio::test]
async fn update_applies_when_remote_is_older() {
    let (remote, clock) = remote_at(QUEUED_AT - 60_000);
    remote.insert("requests", json!({"id": ID, "status": "open"})).await.unwrap();
    clock.set(QUEUED_AT + 60_000);

    let queued = action("requests", ActionKind::Update, json!({"id": ID, "status": "done"}));
    let outcome = replay(&remote, &SyncConfig::default(), &queued).await;

    assert!(matches!(outcome, Replay::Applied { .. }));
    assert_eq!(remote.find("requests", ID).unwrap()["status"], json!("done"));
}

#[parameterized(
    same_instant = { QUEUED_AT, false },
    older = { QUEUED_AT - 1, false },
    newer = { QUEUED_AT + 1, true },
)]
fn update_conflicts_only_when_remote_is_strictly_newer(remote_ms: u64, conflict: bool) {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
        let (remote, _) = remote_at(remote_ms);
        remote.seed("requests", json!({"id": ID, "status": "assigned", "updated_at": to_rfc3339(remote_ms)}));

        let queued = action("requests", ActionKind::Update, json!({"id": ID, "status": "open"}));
        let outcome = replay(&remote, &SyncConfig::default(), &queued).await;

        if conflict {
            assert_eq!(outcome, Replay::Conflict { remote_updated_at: to_rfc3339(remote_ms) });
            assert_eq!(remote.find("requests", ID).unwrap()["status"], json!("assigned"));
        } else {
            assert!(matches!(outcome, Replay::Applied { .. }));
        }
    });
}

#[parameterized(
    missing_row = { None },
    garbage_timestamp = { Some(json!("yesterday")) },
    no_timestamp = { Some(json!(null)) },
)]
fn update_without_comparable_remote_version_applies(updated_at: Option<Value>) {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
        let (remote, _) = remote_at(QUEUED_AT + 1_000);
        if let Some(updated_at) = updated_at {
            remote.seed("requests", json!({"id": ID, "updated_at": updated_at}));
        }

        let queued = action("requests", ActionKind::Update, json!({"id": ID, "status": "open"}));
        let outcome = replay(&remote, &SyncConfig::default(), &queued).await;

        assert!(matches!(outcome, Replay::Applied { .. }), "{outcome:?}");
    });
}

#[tokio::test]
async fn volunteer_update_uses_alternate_key() {
    let (remote, clock) = remote_at(QUEUED_AT + 1_000);
    remote.insert("volunteers", json!({"anonymous_volunteer_id": "anon-1", "status": "idle"})).await.unwrap();
    clock.advance(Duration::from_secs(1));

    let queued = action("volunteers", ActionKind::Update, json!({"anonymous_volunteer_id": "anon-1", "status": "busy"}));
    let outcome = replay(&remote, &SyncConfig::default(), &queued).await;

    assert!(matches!(&outcome, Replay::Applied { record_id, .. } if record_id == "anon-1"));
    assert_eq!(remote.rows("volunteers")[0]["status"], json!("busy"));
    assert_eq!(remote.calls(), vec!["insert:volunteers", "update:volunteers"]);
}

#[parameterized(
    volunteer_without_keys = { "volunteers", ActionKind::Update, json!({"status": "busy"}) },
    request_without_id = { "requests", ActionKind::Update, json!({"status": "done"}) },
    delete_without_id = { "volunteers", ActionKind::Delete, json!({"anonymous_volunteer_id": "anon"}) },
)]
fn actions_without_a_target_are_unidentified(table: &str, kind: ActionKind, payload: Value) {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
        let remote = MemoryRemote::new();
        let outcome = replay(&remote, &SyncConfig::default(), &action(table, kind, payload)).await;
        assert_eq!(outcome, Replay::Unidentified);
        assert!(remote.calls().is_empty());
    });
}

#[tokio::test]
async fn delete_removes_by_id() {
    let remote = MemoryRemote::new();
    remote.seed("messages", json!({"id": ID}));

    let outcome = replay(&remote, &SyncConfig::default(), &action("messages", ActionKind::Delete, json!({"id": ID}))).await;

    assert!(matches!(outcome, Replay::Applied { .. }));
    assert!(remote.rows("messages").is_empty());
}

#[tokio::test]
async fn remote_errors_are_failures() {
    let remote = MemoryRemote::new();
    remote.set_offline(true);

    let outcome = replay(&remote, &SyncConfig::default(), &action("requests", ActionKind::Insert, json!({}))).await;
    assert_eq!(outcome, Replay::Failed(RemoteError::Offline));
}

#[tokio::test(start_paused = true)]
async fn slow_calls_time_out() {
    let remote = MemoryRemote::new();
    remote.set_latency(Some(Duration::from_secs(60)));
    let config = SyncConfig { request_timeout_ms: 500, ..Default::default() };

    let outcome = replay(&remote, &config, &action("requests", ActionKind::Insert, json!({}))).await;
    assert_eq!(outcome, Replay::Failed(RemoteError::Timeout(Duration::from_millis(500))));
}

#[test]
fn audit_row_shape() {
    let queued = action("requests", ActionKind::Update, json!({"id": ID}));
    assert_eq!(
        audit_row(&queued, ID, &json!({"id": ID})),
        json!({
            "owner_id": "owner",
            "table_name": "requests",
            "record_id": ID,
            "action": "update",
            "data": {"id": ID},
            "synced": true,
        })
    );
}
