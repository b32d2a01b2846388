// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! [`RemoteStore`] over a [`Transport`].
//!
//! Each table operation is sent as a `Request` carrying a fresh id; replies
//! are matched back by that id. Replies for requests that were abandoned
//! (for example after a timeout) are skipped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use relief_core::protocol::{ClientMessage, ServerMessage, TableOp};
use relief_core::remote::RemoteFuture;
use relief_core::{Filter, MatchKey, RemoteError, RemoteResult, RemoteStore};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::transport::{Transport, TransportResult};

/// Remote store speaking the relief protocol over a transport.
pub struct TransportRemote<T: Transport> {
    transport: Mutex<T>,
    next_id: AtomicU64,
}

impl<T: Transport> TransportRemote<T> {
    /// Wraps a transport. Calls fail with [`RemoteError::Offline`] until it is connected.
    pub fn new(transport: T) -> Self {
        TransportRemote { transport: Mutex::new(transport), next_id: AtomicU64::new(1) }
    }

    /// Connects the underlying transport, giving up after `limit`.
    pub async fn connect(&self, url: &str, limit: Duration) -> TransportResult<()> {
        self.transport.lock().await.connect(url, limit).await
    }

    pub async fn disconnect(&self) -> TransportResult<()> {
        self.transport.lock().await.disconnect().await
    }

    pub async fn is_connected(&self) -> bool {
        self.transport.lock().await.is_connected()
    }

    /// Round-trips a ping. Returns false if no matching pong arrives.
    pub async fn ping(&self) -> bool {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        matches!(self.exchange(id, ClientMessage::ping(id)).await, Ok(ServerMessage::Pong { .. }))
    }

    async fn request(&self, table: String, op: TableOp) -> RemoteResult<Vec<Value>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, table = %table, op = op.name(), "sending request");
        match self.exchange(id, ClientMessage::request(id, table, op)).await? {
            ServerMessage::Response { result, .. } => result.into_result(),
            other => Err(RemoteError::Transport(format!("unexpected reply to request {id}: {other:?}"))),
        }
    }

    /// Sends `msg` and waits for the reply carrying `id`.
    ///
    /// Replies to abandoned requests are skipped. A free-standing
    /// [`ServerMessage::Error`] names no request, so it is logged and the
    /// wait continues.
    async fn exchange(&self, id: u64, msg: ClientMessage) -> RemoteResult<ServerMessage> {
        let mut transport = self.transport.lock().await;
        if !transport.is_connected() {
            return Err(RemoteError::Offline);
        }

        let frame = msg.to_json().map_err(|e| RemoteError::Transport(e.to_string()))?;
        transport.send(frame).await.map_err(|e| RemoteError::Transport(e.to_string()))?;

        loop {
            let frame = match transport.recv().await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Err(RemoteError::Transport("connection closed".to_string())),
                Err(e) => return Err(RemoteError::Transport(e.to_string())),
            };
            let reply = match ServerMessage::from_json(&frame) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable frame");
                    continue;
                }
            };
            match reply.reply_to() {
                Some(reply_id) if reply_id == id => return Ok(reply),
                Some(reply_id) => debug!(reply_id, "skipping reply to an earlier request"),
                None => {
                    if let ServerMessage::Error { message } = &reply {
                        warn!(%message, "server reported a protocol error");
                    }
                }
            }
        }
    }
}

impl<T: Transport> RemoteStore for TransportRemote<T> {
    fn insert(&self, table: &str, record: Value) -> RemoteFuture<'_, Vec<Value>> {
        let table = table.to_string();
        Box::pin(async move { self.request(table, TableOp::Insert { record }).await })
    }

    fn update(&self, table: &str, patch: Value, key: MatchKey) -> RemoteFuture<'_, Vec<Value>> {
        let table = table.to_string();
        Box::pin(async move { self.request(table, TableOp::Update { patch, key }).await })
    }

    fn select(&self, table: &str, filter: Filter) -> RemoteFuture<'_, Vec<Value>> {
        let table = table.to_string();
        Box::pin(async move { self.request(table, TableOp::Select { filter }).await })
    }

    fn delete(&self, table: &str, key: MatchKey) -> RemoteFuture<'_, Vec<Value>> {
        let table = table.to_string();
        Box::pin(async move { self.request(table, TableOp::Delete { key }).await })
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
