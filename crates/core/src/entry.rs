// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued mutations and sync cycle outcomes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clock::format_iso8601;
use crate::error::{Error, Result};
use crate::protocol::WireEntry;

/// Arbitrary key-value body of a mutation.
pub type Payload = Map<String, Value>;

/// Kind of change a queued entry applies to its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "INSERT" => Ok(Operation::Insert),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            _ => Err(Error::InvalidOperation(s.to_string())),
        }
    }
}

/// Parses a JSON document into a payload, rejecting anything but an object.
pub fn parse_payload(json: &str) -> Result<Payload> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidPayload(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A mutation as supplied by the caller, before it is queued.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub entity_type: String,
    pub entity_id: String,
    pub operation: Operation,
    pub payload: Payload,
    /// Client's last-known version of the entity.
    pub version: i64,
}

impl NewEntry {
    /// Creates an entry with an empty payload and version 0.
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        operation: Operation,
    ) -> Self {
        NewEntry {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            operation,
            payload: Payload::new(),
            version: 0,
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    /// Checks the identifying fields are present.
    pub fn validate(&self) -> Result<()> {
        if self.entity_type.trim().is_empty() {
            return Err(Error::InvalidInput("entity_type must not be empty".to_string()));
        }
        if self.entity_id.trim().is_empty() {
            return Err(Error::InvalidInput("entity_id must not be empty".to_string()));
        }
        Ok(())
    }
}

/// A pending local mutation awaiting confirmation by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEntry {
    /// Locally generated id, distinct from `entity_id`.
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub operation: Operation,
    #[serde(default)]
    pub payload: Payload,
    pub version: i64,
    pub client_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
    pub max_retries: u32,
}

impl QueuedEntry {
    /// Builds a queued entry from caller input.
    pub fn from_new(
        entry: NewEntry,
        id: String,
        client_timestamp: DateTime<Utc>,
        max_retries: u32,
    ) -> Self {
        QueuedEntry {
            id,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            operation: entry.operation,
            payload: entry.payload,
            version: entry.version,
            client_timestamp,
            retry_count: 0,
            max_retries,
        }
    }

    /// Returns true once the entry has used up its retry budget.
    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    /// The fields sent to the push endpoint. `id` and retry state stay local.
    pub fn to_wire(&self) -> WireEntry {
        WireEntry {
            entity_type: self.entity_type.clone(),
            entity_id: self.entity_id.clone(),
            operation: self.operation,
            payload: self.payload.clone(),
            version: self.version,
            client_timestamp: format_iso8601(&self.client_timestamp),
        }
    }
}

/// Outcome of one sync cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub applied: u64,
    pub conflicted: u64,
    pub rejected: u64,
    pub timestamp: DateTime<Utc>,
}

impl SyncResult {
    /// A result with all counts at zero, for cycles with nothing to push.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        SyncResult { applied: 0, conflicted: 0, rejected: 0, timestamp }
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
