// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typed record payloads.
//!
//! The remote tables the client writes to have a small set of known shapes.
//! Each known table gets a struct with the fields the client reads, plus a
//! flattened map so unknown columns survive a round trip. Any other table is
//! carried as a plain JSON object.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::id::{is_valid_uuid, IDENTIFIER_FIELDS};

/// Table holding assistance requests.
pub const REQUESTS_TABLE: &str = "requests";
/// Table holding volunteer profiles.
pub const VOLUNTEERS_TABLE: &str = "volunteers";
/// Table holding messages between requesters and volunteers.
pub const MESSAGES_TABLE: &str = "messages";

/// A typed column: absent (`None`), explicitly null (`Some(None)`) or set.
///
/// An explicit null is written through so updates can clear a column.
pub type Field = Option<Option<String>>;

/// Present keys always deserialize to `Some`, so `null` stays distinct from absent.
fn nullable<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Field, D::Error> {
    Option::<String>::deserialize(deserializer).map(Some)
}

/// An assistance request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub anonymous_victim_id: Field,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub assigned_volunteer_id: Field,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Field,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub location: Field,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub status: Field,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A volunteer profile.
///
/// Volunteers may be known locally only by their externally assigned
/// `anonymous_volunteer_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolunteerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub anonymous_volunteer_id: Field,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub name: Field,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub status: Field,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub location: Field,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A message attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub request_id: Field,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub sender_id: Field,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub content: Field,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A record payload, tagged by the shape of its table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum Record {
    Request(RequestRecord),
    Volunteer(VolunteerRecord),
    Message(MessageRecord),
    /// Any table without a dedicated shape.
    Other(Map<String, Value>),
}

impl Record {
    /// Builds a record for `table` from a JSON value.
    ///
    /// Fails if the value is not an object or a known field has the wrong type.
    pub fn from_value(table: &str, value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::PayloadNotObject(table.to_string()));
        };
        let shape_err = |e: serde_json::Error| Error::PayloadShape {
            table: table.to_string(),
            reason: e.to_string(),
        };
        let record = match table {
            REQUESTS_TABLE => {
                Record::Request(serde_json::from_value(Value::Object(map)).map_err(shape_err)?)
            }
            VOLUNTEERS_TABLE => {
                Record::Volunteer(serde_json::from_value(Value::Object(map)).map_err(shape_err)?)
            }
            MESSAGES_TABLE => {
                Record::Message(serde_json::from_value(Value::Object(map)).map_err(shape_err)?)
            }
            _ => Record::Other(map),
        };
        Ok(record)
    }

    /// Builds a record holding only a primary id.
    pub fn with_id(table: &str, id: &str) -> Self {
        let id = Some(id.to_string());
        match table {
            REQUESTS_TABLE => Record::Request(RequestRecord { id, ..Default::default() }),
            VOLUNTEERS_TABLE => Record::Volunteer(VolunteerRecord { id, ..Default::default() }),
            MESSAGES_TABLE => Record::Message(MessageRecord { id, ..Default::default() }),
            _ => {
                let mut map = Map::new();
                map.insert("id".to_string(), id.map(Value::String).unwrap_or(Value::Null));
                Record::Other(map)
            }
        }
    }

    /// Converts the record back into the JSON object sent to the remote.
    pub fn to_value(&self) -> Value {
        let value = match self {
            Record::Request(r) => serde_json::to_value(r),
            Record::Volunteer(r) => serde_json::to_value(r),
            Record::Message(r) => serde_json::to_value(r),
            Record::Other(map) => return Value::Object(map.clone()),
        };
        value.unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// The record's primary id, if known.
    pub fn id(&self) -> Option<&str> {
        match self {
            Record::Request(r) => r.id.as_deref(),
            Record::Volunteer(r) => r.id.as_deref(),
            Record::Message(r) => r.id.as_deref(),
            Record::Other(map) => map.get("id").and_then(Value::as_str),
        }
    }

    /// Sets the record's primary id.
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        match self {
            Record::Request(r) => r.id = Some(id),
            Record::Volunteer(r) => r.id = Some(id),
            Record::Message(r) => r.id = Some(id),
            Record::Other(map) => {
                map.insert("id".to_string(), Value::String(id));
            }
        }
    }

    /// Reads any top-level string field by name.
    pub fn str_field(&self, field: &str) -> Option<String> {
        if field == "id" {
            return self.id().map(str::to_string);
        }
        self.to_value().get(field).and_then(Value::as_str).map(str::to_string)
    }

    /// Checks every identifier field present in the payload.
    ///
    /// Absent and null fields pass; anything else must be a valid UUID string.
    pub fn validate_identifiers(&self) -> Result<()> {
        let value = self.to_value();
        for field in IDENTIFIER_FIELDS {
            match value.get(*field) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if is_valid_uuid(s) => {}
                Some(other) => {
                    let value = other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string());
                    return Err(Error::InvalidIdentifier { field: (*field).to_string(), value });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
