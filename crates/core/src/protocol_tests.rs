// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    insert = { ClientMessage::request(1, "requests", TableOp::Insert { record: json!({"description": "water"}) }) },
    update = { ClientMessage::request(2, "volunteers", TableOp::Update { patch: json!({"status": "busy"}), key: MatchKey::new("anonymous_volunteer_id", "a1") }) },
    select = { ClientMessage::request(3, "requests", TableOp::Select { filter: Filter::all().eq("anonymous_victim_id", "v1") }) },
    delete = { ClientMessage::request(4, "messages", TableOp::Delete { key: MatchKey::id("m1") }) },
    ping = { ClientMessage::ping(12345) },
)]
fn client_message_roundtrip(msg: ClientMessage) {
    let json = msg.to_json().unwrap();
    let parsed = ClientMessage::from_json(&json).unwrap();
    assert_eq!(msg, parsed);
}

#[parameterized(
    rows = { ServerMessage::rows(7, vec![json!({"id": "r1"})]) },
    failure = { ServerMessage::failure(7, "duplicate id") },
    pong = { ServerMessage::pong(12345) },
    error = { ServerMessage::error("Something went wrong") },
)]
fn server_message_roundtrip(msg: ServerMessage) {
    let json = msg.to_json().unwrap();
    let parsed = ServerMessage::from_json(&json).unwrap();
    assert_eq!(msg, parsed);
}

#[parameterized(
    rows = { ServerMessage::rows(7, vec![]), Some(7) },
    failure = { ServerMessage::failure(8, "nope"), Some(8) },
    pong = { ServerMessage::pong(9), Some(9) },
    error = { ServerMessage::error("bad frame"), None },
)]
fn reply_to_names_the_answered_request(msg: ServerMessage, expected: Option<u64>) {
    assert_eq!(msg.reply_to(), expected);
}

#[test]
fn message_json_format() {
    let msg = ClientMessage::request(9, "requests", TableOp::Delete { key: MatchKey::id("r1") });
    let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "request",
            "id": 9,
            "table": "requests",
            "op": {"kind": "delete", "key": {"field": "id", "value": "r1"}}
        })
    );

    let msg = ServerMessage::failure(9, "nope");
    let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        json!({"type": "response", "id": 9, "result": {"status": "error", "message": "nope"}})
    );
}

#[test]
fn select_filter_defaults_to_all() {
    let msg = ClientMessage::from_json(
        r#"{"type":"request","id":1,"table":"requests","op":{"kind":"select"}}"#,
    )
    .unwrap();
    assert_eq!(msg, ClientMessage::request(1, "requests", TableOp::Select { filter: Filter::all() }));
}

#[test]
fn outcome_into_result() {
    assert_eq!(Outcome::Ok { rows: vec![json!(1)] }.into_result(), Ok(vec![json!(1)]));
    assert_eq!(
        Outcome::Error { message: "bad".into() }.into_result(),
        Err(RemoteError::Rejected("bad".into()))
    );
}

#[test]
fn unknown_message_type_is_an_error() {
    assert!(ClientMessage::from_json(r#"{"type":"snapshot"}"#).is_err());
}
