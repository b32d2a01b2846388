// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Holds the canonical record tables in SQLite. Every table lives in one
//! `records` table keyed by `(table_name, id)`; the row itself is stored as
//! a JSON body so tables need no schema of their own.

use std::path::Path;
use std::sync::Arc;

use rusqlite::{params, Connection, ErrorCode};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use relief_core::clock::to_rfc3339;
use relief_core::id::new_id;
use relief_core::protocol::TableOp;
use relief_core::{ClockSource, Filter, MatchKey, SystemClock};

const DB_FILE_NAME: &str = "relief.db";

/// SQL schema for the record store.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    table_name TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (table_name, id)
);
"#;

/// Errors from executing a table operation.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The operation was refused; reported to the client verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("corrupted record body: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StateResult<T> = Result<T, StateError>;

/// Shared server state containing the canonical record store.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    /// The record database (one writer at a time).
    db: Mutex<Connection>,
    /// Clock used to stamp `created_at` and `updated_at`.
    clock: Arc<dyn ClockSource>,
}

impl ServerState {
    /// Opens (creating if needed) the record store in the given directory.
    pub fn open(data_dir: &Path) -> StateResult<Self> {
        let conn = Connection::open(data_dir.join(DB_FILE_NAME))?;
        Self::init(conn, Arc::new(SystemClock))
    }

    /// Opens a private in-memory store stamping times from `clock`.
    pub fn in_memory(clock: Arc<dyn ClockSource>) -> StateResult<Self> {
        Self::init(Connection::open_in_memory()?, clock)
    }

    fn init(conn: Connection, clock: Arc<dyn ClockSource>) -> StateResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(ServerState { inner: Arc::new(ServerStateInner { db: Mutex::new(conn), clock }) })
    }

    /// Executes one table operation and returns the affected rows.
    pub async fn apply(&self, table: &str, op: TableOp) -> StateResult<Vec<Value>> {
        match op {
            TableOp::Insert { record } => self.insert(table, record).await,
            TableOp::Update { patch, key } => self.update(table, patch, &key).await,
            TableOp::Select { filter } => self.select(table, &filter).await,
            TableOp::Delete { key } => self.delete(table, &key).await,
        }
    }

    fn now(&self) -> String {
        to_rfc3339(self.inner.clock.now_ms())
    }

    /// Inserts a record, assigning an id when it has none.
    ///
    /// `updated_at` is always stamped; `created_at` only when missing.
    pub async fn insert(&self, table: &str, record: Value) -> StateResult<Vec<Value>> {
        let Value::Object(mut row) = record else {
            return Err(StateError::Rejected("record must be a JSON object".to_string()));
        };
        let id = match row.get("id") {
            Some(Value::String(id)) => id.clone(),
            None | Some(Value::Null) => new_id(),
            Some(other) => {
                return Err(StateError::Rejected(format!("id must be a string, got {other}")));
            }
        };
        let now = self.now();
        row.insert("id".to_string(), Value::String(id.clone()));
        row.entry("created_at").or_insert_with(|| Value::String(now.clone()));
        row.insert("updated_at".to_string(), Value::String(now.clone()));
        let row = Value::Object(row);

        let db = self.inner.db.lock().await;
        let result = db.execute(
            "INSERT INTO records (table_name, id, body, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![table, id, row.to_string(), now],
        );
        match result {
            Ok(_) => {
                debug!("inserted {}.{}", table, id);
                Ok(vec![row])
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StateError::Rejected(format!(
                    "duplicate key value violates unique constraint on {table}.id: {id}"
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Merges `patch` into every row matching `key` and stamps `updated_at`.
    ///
    /// A row's `id` is never changed by a patch.
    pub async fn update(&self, table: &str, patch: Value, key: &MatchKey) -> StateResult<Vec<Value>> {
        let Value::Object(patch) = patch else {
            return Err(StateError::Rejected("patch must be a JSON object".to_string()));
        };
        let now = self.now();
        let mut db = self.inner.db.lock().await;
        let tx = db.transaction()?;
        let mut updated = Vec::new();
        for (id, mut row) in matching_rows(&tx, table, &Filter { eq: vec![key.clone()] })? {
            if let Some(fields) = row.as_object_mut() {
                merge(fields, &patch);
                fields.insert("updated_at".to_string(), Value::String(now.clone()));
            }
            tx.execute(
                "UPDATE records SET body = ?3, updated_at = ?4 WHERE table_name = ?1 AND id = ?2",
                params![table, id, row.to_string(), now],
            )?;
            updated.push(row);
        }
        tx.commit()?;
        debug!("updated {} row(s) in {} by {}", updated.len(), table, key.field);
        Ok(updated)
    }

    /// Returns the rows of `table` matching `filter`, in insertion order.
    pub async fn select(&self, table: &str, filter: &Filter) -> StateResult<Vec<Value>> {
        let db = self.inner.db.lock().await;
        let rows = matching_rows(&db, table, filter)?;
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    /// Deletes every row matching `key` and returns them.
    pub async fn delete(&self, table: &str, key: &MatchKey) -> StateResult<Vec<Value>> {
        let mut db = self.inner.db.lock().await;
        let tx = db.transaction()?;
        let mut removed = Vec::new();
        for (id, row) in matching_rows(&tx, table, &Filter { eq: vec![key.clone()] })? {
            tx.execute("DELETE FROM records WHERE table_name = ?1 AND id = ?2", params![table, id])?;
            removed.push(row);
        }
        tx.commit()?;
        debug!("deleted {} row(s) from {}", removed.len(), table);
        Ok(removed)
    }
}

/// Loads `(id, body)` for every row of `table` matching `filter`.
fn matching_rows(conn: &Connection, table: &str, filter: &Filter) -> StateResult<Vec<(String, Value)>> {
    let mut stmt =
        conn.prepare("SELECT id, body FROM records WHERE table_name = ?1 ORDER BY rowid")?;
    let raw = stmt
        .query_map(params![table], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::new();
    for (id, body) in raw {
        let row: Value = serde_json::from_str(&body)?;
        if filter.matches(&row) {
            rows.push((id, row));
        }
    }
    Ok(rows)
}

fn merge(row: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (field, value) in patch.iter().filter(|(field, _)| field.as_str() != "id") {
        row.insert(field.clone(), value.clone());
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
