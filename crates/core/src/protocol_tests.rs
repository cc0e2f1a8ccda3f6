// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use similar_asserts::assert_eq;
use yare::parameterized;

#[test]
fn push_request_wire_shape() {
    let mut payload = Payload::new();
    payload.insert("reason".into(), json!("jam"));
    let request = PushRequest {
        client_id: "client-1".into(),
        entries: vec![WireEntry {
            entity_type: "downtime_event".into(),
            entity_id: "7".into(),
            operation: Operation::Update,
            payload,
            version: 3,
            client_timestamp: "2026-01-10T12:00:00.000Z".into(),
        }],
    };

    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "client_id": "client-1",
            "entries": [{
                "entity_type": "downtime_event",
                "entity_id": "7",
                "operation": "UPDATE",
                "payload": {"reason": "jam"},
                "version": 3,
                "client_timestamp": "2026-01-10T12:00:00.000Z"
            }]
        })
    );
}

#[test]
fn push_response_with_conflicts() {
    let body = json!({
        "applied": 1,
        "conflicted": 1,
        "rejected": 0,
        "conflicts": [{
            "sync_id": "s-1",
            "entity_type": "production_log",
            "entity_id": "42",
            "client_version": 1,
            "server_version": 2
        }]
    });
    let response: PushResponse = serde_json::from_value(body).unwrap();

    assert_eq!(response.applied, 1);
    assert_eq!(response.conflicted, 1);
    assert_eq!(
        response.conflicts,
        vec![ConflictInfo {
            sync_id: "s-1".into(),
            entity_type: "production_log".into(),
            entity_id: "42".into(),
            client_version: 1,
            server_version: 2,
        }]
    );
}

#[parameterized(
    empty_object = { json!({}) },
    counts_only = { json!({"applied": 0, "conflicted": 0, "rejected": 0}) },
    extra_fields = { json!({"applied": 0, "success": true}) },
)]
fn push_response_defaults(body: serde_json::Value) {
    use similar_asserts::assert_eq;
    let response: PushResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response, PushResponse::default());
}

#[test]
fn conflict_accepts_numeric_ids() {
    let body = json!({
        "sync_id": 901,
        "entity_type": "production_log",
        "entity_id": 42,
        "client_version": 1,
        "server_version": 2
    });
    let conflict: ConflictInfo = serde_json::from_value(body).unwrap();
    assert_eq!(conflict.sync_id, "901");
    assert_eq!(conflict.entity_id, "42");
}

#[test]
fn pull_request_wire_shape() {
    let request = PullRequest {
        client_id: "client-1".into(),
        entity_types: vec!["production_log".into(), "downtime_event".into()],
        last_sync_timestamp: EPOCH_WATERMARK.into(),
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "client_id": "client-1",
            "entity_types": ["production_log", "downtime_event"],
            "last_sync_timestamp": "1970-01-01T00:00:00.000Z"
        })
    );
}

#[test]
fn pull_response_uses_camel_case_watermark() {
    let body = json!({
        "entries": [{"entity_type": "machine", "entity_id": "m-1"}],
        "syncTimestamp": "2026-01-10T12:00:00.000Z"
    });
    let response: PullResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.entries.len(), 1);
    assert_eq!(response.sync_timestamp, "2026-01-10T12:00:00.000Z");
}

#[test]
fn pull_response_without_entries() {
    let body = json!({"syncTimestamp": "2026-01-10T12:00:00.000Z"});
    let response: PullResponse = serde_json::from_value(body).unwrap();
    assert!(response.entries.is_empty());
}

#[test]
fn pull_response_requires_watermark() {
    let body = json!({"entries": []});
    assert!(serde_json::from_value::<PullResponse>(body).is_err());
}
