// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use relief_core::id::is_valid_uuid;
use relief_core::ManualClock;
use serde_json::json;
use std::time::Duration;
use yare::parameterized;

const T0: &str = "2023-11-14T22:13:20.000Z";
const T1: &str = "2023-11-14T22:13:25.000Z";

fn state() -> (ServerState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    (ServerState::in_memory(clock.clone()).unwrap(), clock)
}

#[tokio::test]
async fn insert_assigns_id_and_stamps() {
    let (state, _) = state();

    let rows = state.insert("requests", json!({"description": "water"})).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert!(is_valid_uuid(rows[0]["id"].as_str().unwrap()));
    assert_eq!(rows[0]["created_at"], json!(T0));
    assert_eq!(rows[0]["updated_at"], json!(T0));
    assert_eq!(state.select("requests", &Filter::all()).await.unwrap(), rows);
}

#[tokio::test]
async fn insert_keeps_client_id_and_created_at() {
    let (state, _) = state();

    let rows = state
        .insert("requests", json!({"id": "r1", "created_at": "2020-01-01T00:00:00.000Z"}))
        .await
        .unwrap();

    assert_eq!(rows[0]["id"], json!("r1"));
    assert_eq!(rows[0]["created_at"], json!("2020-01-01T00:00:00.000Z"));
}

#[tokio::test]
async fn duplicate_id_is_rejected() {
    let (state, _) = state();
    state.insert("requests", json!({"id": "r1"})).await.unwrap();

    let err = state.insert("requests", json!({"id": "r1"})).await.unwrap_err();

    assert!(matches!(err, StateError::Rejected(_)));
    assert!(err.to_string().contains("requests.id: r1"));
    // Same id in another table is fine
    assert!(state.insert("messages", json!({"id": "r1"})).await.is_ok());
}

#[parameterized(
    array = { json!(["x"]) },
    number_id = { json!({"id": 7}) },
)]
fn bad_insert_is_rejected(record: Value) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let (state, _) = state();

    let result = runtime.block_on(state.insert("requests", record));

    assert!(matches!(result, Err(StateError::Rejected(_))));
}

#[tokio::test]
async fn update_merges_and_restamps() {
    let (state, clock) = state();
    state.insert("requests", json!({"id": "r1", "status": "open", "notes": "x"})).await.unwrap();
    clock.advance(Duration::from_secs(5));

    let rows = state
        .update("requests", json!({"id": "other", "status": "done"}), &MatchKey::id("r1"))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!("r1"));
    assert_eq!(rows[0]["status"], json!("done"));
    assert_eq!(rows[0]["notes"], json!("x"));
    assert_eq!(rows[0]["created_at"], json!(T0));
    assert_eq!(rows[0]["updated_at"], json!(T1));
    let stored = state.select("requests", &Filter::all().eq("id", "r1")).await.unwrap();
    assert_eq!(stored, rows);
}

#[tokio::test]
async fn update_by_alternate_key() {
    let (state, _) = state();
    state.insert("volunteers", json!({"anonymous_volunteer_id": "anon-9", "status": "idle"})).await.unwrap();

    let rows = state
        .update("volunteers", json!({"status": "active"}), &MatchKey::new("anonymous_volunteer_id", "anon-9"))
        .await
        .unwrap();

    assert_eq!(rows[0]["status"], json!("active"));
}

#[tokio::test]
async fn update_without_match_is_empty() {
    let (state, _) = state();
    let rows = state.update("requests", json!({"status": "done"}), &MatchKey::id("nope")).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn select_filters_on_every_condition() {
    let (state, _) = state();
    state.insert("requests", json!({"id": "1", "anonymous_victim_id": "v1", "status": "open"})).await.unwrap();
    state.insert("requests", json!({"id": "2", "anonymous_victim_id": "v1", "status": "done"})).await.unwrap();
    state.insert("requests", json!({"id": "3", "anonymous_victim_id": "v2", "status": "open"})).await.unwrap();

    let mine = state.select("requests", &Filter::all().eq("anonymous_victim_id", "v1")).await.unwrap();
    let open_mine = state
        .select("requests", &Filter::all().eq("anonymous_victim_id", "v1").eq("status", "open"))
        .await
        .unwrap();

    let ids = |rows: &[Value]| rows.iter().map(|r| r["id"].clone()).collect::<Vec<_>>();
    assert_eq!(ids(&mine), vec![json!("1"), json!("2")]);
    assert_eq!(ids(&open_mine), vec![json!("1")]);
    assert!(state.select("messages", &Filter::all()).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_returns_removed_rows() {
    let (state, _) = state();
    state.insert("requests", json!({"id": "1"})).await.unwrap();
    state.insert("requests", json!({"id": "2"})).await.unwrap();

    let removed = state.delete("requests", &MatchKey::id("1")).await.unwrap();

    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0]["id"], json!("1"));
    let left = state.select("requests", &Filter::all()).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0]["id"], json!("2"));
}

#[tokio::test]
async fn apply_dispatches_table_ops() {
    let (state, _) = state();

    let inserted = state.apply("messages", TableOp::Insert { record: json!({"content": "hi"}) }).await.unwrap();
    let id = inserted[0]["id"].as_str().unwrap().to_string();
    let selected = state.apply("messages", TableOp::Select { filter: Filter::all() }).await.unwrap();
    let deleted = state.apply("messages", TableOp::Delete { key: MatchKey::id(id) }).await.unwrap();

    assert_eq!(selected, inserted);
    assert_eq!(deleted, inserted);
}

#[tokio::test]
async fn records_persist_across_reopen() {
    let temp = tempfile::tempdir().unwrap();
    {
        let state = ServerState::open(temp.path()).unwrap();
        state.insert("requests", json!({"id": "r1"})).await.unwrap();
    }

    let state = ServerState::open(temp.path()).unwrap();
    let rows = state.select("requests", &Filter::all()).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert!(temp.path().join("relief.db").exists());
}
