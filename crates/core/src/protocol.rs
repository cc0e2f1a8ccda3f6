// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP protocol messages for the sync endpoints.
//!
//! The protocol is two JSON request/response pairs:
//! - `POST /api/v1/sync/push`: client submits queued mutations
//! - `POST /api/v1/sync/pull`: client asks for server changes since a watermark

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::entry::{Operation, Payload};

/// Path of the push endpoint, relative to the base URL.
pub const PUSH_PATH: &str = "/api/v1/sync/push";
/// Path of the pull endpoint, relative to the base URL.
pub const PULL_PATH: &str = "/api/v1/sync/pull";
/// Watermark sent before the first successful pull.
pub const EPOCH_WATERMARK: &str = "1970-01-01T00:00:00.000Z";

/// One queued mutation as sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEntry {
    pub entity_type: String,
    pub entity_id: String,
    pub operation: Operation,
    pub payload: Payload,
    pub version: i64,
    pub client_timestamp: String,
}

/// Body of a push request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    pub client_id: String,
    pub entries: Vec<WireEntry>,
}

/// Body of a successful push response.
///
/// Missing counts are read as zero and a missing `conflicts` as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushResponse {
    #[serde(default)]
    pub applied: u64,
    #[serde(default)]
    pub conflicted: u64,
    #[serde(default)]
    pub rejected: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ConflictInfo>,
}

/// A server-side rejection due to a version mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub sync_id: String,
    pub entity_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub entity_id: String,
    pub client_version: i64,
    pub server_version: i64,
}

/// Body of a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub client_id: String,
    pub entity_types: Vec<String>,
    pub last_sync_timestamp: String,
}

/// Body of a successful pull response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullResponse {
    #[serde(default)]
    pub entries: Vec<Value>,
    #[serde(rename = "syncTimestamp")]
    pub sync_timestamp: String,
}

/// Ids are strings on our side, but servers backed by integer keys send numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
