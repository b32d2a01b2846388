// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! The protocol is simple:
//! - Client sends table requests tagged with a client-chosen id
//! - Server answers each request with a response carrying the same id
//!
//! Responses may arrive out of order; clients correlate them by id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::remote::{Filter, MatchKey, RemoteError, RemoteResult};

/// A table operation carried by a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableOp {
    Insert {
        record: Value,
    },
    Update {
        patch: Value,
        key: MatchKey,
    },
    Select {
        #[serde(default)]
        filter: Filter,
    },
    Delete {
        key: MatchKey,
    },
}

impl TableOp {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            TableOp::Insert { .. } => "insert",
            TableOp::Update { .. } => "update",
            TableOp::Select { .. } => "select",
            TableOp::Delete { .. } => "delete",
        }
    }
}

/// Result of a table request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The affected (or selected) rows.
    Ok { rows: Vec<Value> },
    /// The server refused or failed the operation.
    Error { message: String },
}

impl Outcome {
    /// Converts a server answer into the remote boundary's result type.
    pub fn into_result(self) -> RemoteResult<Vec<Value>> {
        match self {
            Outcome::Ok { rows } => Ok(rows),
            Outcome::Error { message } => Err(RemoteError::Rejected(message)),
        }
    }
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Run one operation against a table.
    Request {
        /// Client-chosen ID echoed in the Response.
        id: u64,
        table: String,
        op: TableOp,
    },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Answer to a Request.
    Response {
        /// Echoed from the Request message.
        id: u64,
        result: Outcome,
    },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// Error not tied to a request, such as an unparseable frame.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Request message.
    pub fn request(id: u64, table: impl Into<String>, op: TableOp) -> Self {
        ClientMessage::Request { id, table: table.into(), op }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates a successful Response.
    pub fn rows(id: u64, rows: Vec<Value>) -> Self {
        ServerMessage::Response { id, result: Outcome::Ok { rows } }
    }

    /// Creates a failed Response.
    pub fn failure(id: u64, message: impl Into<String>) -> Self {
        ServerMessage::Response { id, result: Outcome::Error { message: message.into() } }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error { message: message.into() }
    }

    /// The client message id this answers, if it answers one.
    pub fn reply_to(&self) -> Option<u64> {
        match self {
            ServerMessage::Response { id, .. } | ServerMessage::Pong { id } => Some(*id),
            ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
