// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

fn action(retry_count: u32, last_attempt_at: Option<u64>) -> QueuedAction {
    QueuedAction {
        id: "a1".into(),
        table: "requests".into(),
        action: ActionKind::Insert,
        payload: Record::from_value("requests", json!({})).unwrap(),
        created_at: 0,
        local_created_at: "1970-01-01T00:00:00.000Z".into(),
        local_updated_at: "1970-01-01T00:00:00.000Z".into(),
        owner_id: "owner".into(),
        priority: Priority::Medium,
        retry_count,
        last_attempt_at,
        seq: 0,
    }
}

#[parameterized(
    high = { "high", Priority::High },
    medium = { "medium", Priority::Medium },
    low_upper = { "LOW", Priority::Low },
)]
fn priority_parse(input: &str, expected: Priority) {
    assert_eq!(input.parse::<Priority>().unwrap(), expected);
    assert_eq!(expected.to_string(), input.to_lowercase());
}

#[test]
fn priority_weights_order_high_first() {
    assert!(Priority::High.weight() > Priority::Medium.weight());
    assert!(Priority::Medium.weight() > Priority::Low.weight());
    assert_eq!(Priority::default(), Priority::Medium);
    assert!("urgent".parse::<Priority>().is_err());
}

#[parameterized(
    insert = { "insert", ActionKind::Insert },
    update = { "update", ActionKind::Update },
    delete = { "delete", ActionKind::Delete },
)]
fn action_kind_parse(input: &str, expected: ActionKind) {
    assert_eq!(input.parse::<ActionKind>().unwrap(), expected);
    assert_eq!(expected.to_string(), input);
}

#[test]
fn action_kind_rejects_unknown() {
    assert!(matches!("upsert".parse::<ActionKind>(), Err(Error::InvalidAction(_))));
}

#[parameterized(
    never_tried = { 0, 0 },
    first_retry = { 1, 1_000 },
    second_retry = { 2, 2_000 },
    third_retry = { 3, 4_000 },
)]
fn backoff_doubles(retry_count: u32, expected_ms: u64) {
    let a = action(retry_count, Some(0));
    assert_eq!(a.backoff(Duration::from_secs(1)), Duration::from_millis(expected_ms));
}

#[test]
fn is_due_respects_window() {
    let base = Duration::from_secs(1);
    let a = action(2, Some(10_000));
    assert!(!a.is_due(11_999, base));
    assert!(a.is_due(12_000, base));
    assert!(action(0, None).is_due(0, base));
}

#[test]
fn record_failure_bumps_count_and_stamps() {
    let mut a = action(0, None);
    a.record_failure(500);
    a.record_failure(900);
    assert_eq!(a.retry_count, 2);
    assert_eq!(a.last_attempt_at, Some(900));
}

#[test]
fn serde_defaults_for_optional_bookkeeping() {
    let mut value = serde_json::to_value(action(0, None)).unwrap();
    let obj = value.as_object_mut().unwrap();
    obj.remove("priority");
    obj.remove("retry_count");
    obj.remove("seq");
    assert!(!obj.contains_key("last_attempt_at"));

    let parsed: QueuedAction = serde_json::from_value(value).unwrap();
    assert_eq!(parsed.priority, Priority::Medium);
    assert_eq!(parsed.retry_count, 0);
}
