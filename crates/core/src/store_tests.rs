// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::tempdir;

fn exercise_basic(store: &dyn LocalStore) {
    assert_eq!(store.get("a").unwrap(), None);

    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();
    store.set("a", "3").unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("3"));
    assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);

    store.remove("a").unwrap();
    store.remove("missing").unwrap();
    assert_eq!(store.get("a").unwrap(), None);
    assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
}

fn exercise_prefix(store: &dyn LocalStore) {
    store.set("cache_x", "1").unwrap();
    store.set("cache_y", "2").unwrap();
    store.set("queue", "3").unwrap();
    store.set("cache%", "4").unwrap();

    let mut keys = store.keys_with_prefix("cache_").unwrap();
    keys.sort();
    assert_eq!(keys, vec!["cache_x".to_string(), "cache_y".to_string()]);
}

fn exercise_quota(store: &dyn LocalStore) {
    // quota is 10 bytes: "k1" + "abcd" = 6
    store.set("k1", "abcd").unwrap();
    let err = store.set("k2", "abcdef").unwrap_err();
    assert!(matches!(err, StoreError::QuotaExceeded { needed: 14, quota: 10 }));
    assert_eq!(store.get("k2").unwrap(), None);

    // replacing an entry only counts the difference
    store.set("k1", "abcdefgh").unwrap();
    assert_eq!(store.get("k1").unwrap().as_deref(), Some("abcdefgh"));
}

#[test]
fn memory_store_basic() {
    exercise_basic(&MemoryStore::new());
}

#[test]
fn memory_store_prefix() {
    exercise_prefix(&MemoryStore::new());
}

#[test]
fn memory_store_quota() {
    let store = MemoryStore::with_quota(10);
    exercise_quota(&store);
    assert_eq!(store.used_bytes().unwrap(), 10);
}

#[test]
fn sqlite_store_basic() {
    exercise_basic(&SqliteStore::open_in_memory().unwrap());
}

#[test]
fn sqlite_store_prefix() {
    exercise_prefix(&SqliteStore::open_in_memory().unwrap());
}

#[test]
fn sqlite_store_quota() {
    exercise_quota(&SqliteStore::open_in_memory().unwrap().with_quota(10));
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local.db");

    {
        let store = SqliteStore::open(&path).unwrap();
        store.set("k", "v").unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
}
