// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the sync module.
//!
//! These tests verify complete flows against an in-memory server:
//! - Offline session, reconnect and flush
//! - Queue persistence across manager restarts
//! - Two clients exchanging changes
//! - Stale-version conflicts

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::events::{EventKind, SyncEvent};
use super::manager::SyncManager;
use super::queue::QueueFile;
use super::test_helpers::{make_new_entry, test_config, test_now, wait_until};
use super::transport::{Transport, TransportError, TransportFuture};
use fos_core::{
    ConflictInfo, FixedClock, NewEntry, Operation, PullRequest, PullResponse, PushRequest,
    PushResponse,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// A row stored by the fake server.
struct Row {
    version: i64,
    changed_at: String,
    changed_by: String,
    payload: Value,
}

#[derive(Default)]
struct ServerState {
    rows: HashMap<(String, String), Row>,
    /// Bumped on every applied change; rendered as the watermark.
    tick: u32,
    next_sync_id: u32,
}

/// Minimal FactoryOS server: last-writer-wins with a version check.
#[derive(Clone, Default)]
struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    fn watermark(tick: u32) -> String {
        format!("2026-01-10T13:{:02}:{:02}.000Z", tick / 60, tick % 60)
    }

    fn version_of(&self, entity_type: &str, entity_id: &str) -> Option<i64> {
        let state = self.state.lock().unwrap();
        state
            .rows
            .get(&(entity_type.to_string(), entity_id.to_string()))
            .map(|row| row.version)
    }
}

impl Transport for FakeServer {
    fn push(&self, request: PushRequest) -> TransportFuture<'_, PushResponse> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            let mut response = PushResponse::default();
            for entry in request.entries {
                let key = (entry.entity_type.clone(), entry.entity_id.clone());
                let current = state.rows.get(&key).map(|row| row.version).unwrap_or(0);
                if entry.version < current {
                    state.next_sync_id += 1;
                    response.conflicted += 1;
                    response.conflicts.push(ConflictInfo {
                        sync_id: format!("sync-{}", state.next_sync_id),
                        entity_type: entry.entity_type,
                        entity_id: entry.entity_id,
                        client_version: entry.version,
                        server_version: current,
                    });
                    continue;
                }
                state.tick += 1;
                let row = Row {
                    version: entry.version.max(current) + 1,
                    changed_at: Self::watermark(state.tick),
                    changed_by: request.client_id.clone(),
                    payload: Value::Object(entry.payload),
                };
                state.rows.insert(key, row);
                response.applied += 1;
            }
            Ok(response)
        })
    }

    fn pull(&self, request: PullRequest) -> TransportFuture<'_, PullResponse> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            let mut entries: Vec<(String, Value)> = state
                .rows
                .iter()
                .filter(|((entity_type, _), row)| {
                    request.entity_types.contains(entity_type)
                        && row.changed_at > request.last_sync_timestamp
                        && row.changed_by != request.client_id
                })
                .map(|((entity_type, entity_id), row)| {
                    let value = json!({
                        "entity_type": entity_type,
                        "entity_id": entity_id,
                        "version": row.version,
                        "payload": row.payload,
                    });
                    (row.changed_at.clone(), value)
                })
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(PullResponse {
                entries: entries.into_iter().map(|(_, value)| value).collect(),
                sync_timestamp: Self::watermark(state.tick),
            })
        })
    }
}

/// Transport that is always unreachable.
struct Unreachable;

impl Transport for Unreachable {
    fn push(&self, _request: PushRequest) -> TransportFuture<'_, PushResponse> {
        Box::pin(async { Err(TransportError::Status { status: 503, body: "down".into() }) })
    }

    fn pull(&self, _request: PullRequest) -> TransportFuture<'_, PullResponse> {
        Box::pin(async { Err(TransportError::Status { status: 503, body: "down".into() }) })
    }
}

fn client(server: &FakeServer, client_id: &str) -> SyncManager<FakeServer> {
    let config = test_config().with_client_id(client_id);
    SyncManager::with_transport_and_clock(
        config,
        server.clone(),
        Arc::new(FixedClock::new(test_now())),
    )
}

/// Record every event in emission order.
fn record_all<T: Transport + 'static>(manager: &SyncManager<T>) -> Arc<Mutex<Vec<SyncEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for kind in EventKind::ALL {
        let sink = Arc::clone(&seen);
        manager.on(kind, move |event| sink.lock().unwrap().push(event.clone()));
    }
    seen
}

#[tokio::test]
async fn test_offline_session_then_reconnect() {
    let server = FakeServer::default();
    let manager = client(&server, "line-1");
    let events = record_all(&manager);

    manager.set_online(false);
    manager.enqueue(make_new_entry("1"));
    manager.enqueue(make_new_entry("2"));
    assert_eq!(server.version_of("production_log", "1"), None);

    manager.set_online(true);
    assert!(
        wait_until(|| matches!(events.lock().unwrap().last(), Some(SyncEvent::SyncComplete(_))))
            .await
    );

    assert_eq!(manager.queue_size(), 0);
    assert_eq!(server.version_of("production_log", "1"), Some(2));
    assert_eq!(server.version_of("production_log", "2"), Some(2));

    let kinds: Vec<&str> = events
        .lock()
        .unwrap()
        .iter()
        .map(|e| e.kind().as_event_name())
        .collect();
    // No remoteChanges: the client's own writes are not echoed back.
    assert_eq!(
        kinds,
        vec![
            "onlineChange",
            "queueChanged",
            "queueChanged",
            "onlineChange",
            "syncStart",
            "queueChanged",
            "syncComplete",
        ]
    );
    assert_eq!(
        manager.last_sync_timestamp().map(|w| w.to_string()),
        Some("2026-01-10T13:00:02.000Z".to_string())
    );
}

#[tokio::test]
async fn test_queue_persists_across_restarts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("queue.jsonl");
    let server = FakeServer::default();

    // First run: offline, entries land in the file.
    {
        let manager = client(&server, "line-1");
        manager.set_online(false);
        manager.enqueue(make_new_entry("1"));
        manager.enqueue(make_new_entry("2"));
        let mut file = QueueFile::open(&path).unwrap();
        file.save(&manager.queue()).unwrap();
        manager.destroy();
    }

    // Second run: restore, sync, save what is left.
    let manager = client(&server, "line-1");
    let mut file = QueueFile::open(&path).unwrap();
    let restored = file.load().unwrap();
    assert_eq!(restored.len(), 2);
    manager.restore_queue(restored);

    let result = manager.sync().await.unwrap().unwrap();
    assert_eq!(result.applied, 2);
    file.save(&manager.queue()).unwrap();

    assert!(file.load().unwrap().is_empty());
    assert_eq!(server.version_of("production_log", "2"), Some(2));
}

#[tokio::test]
async fn test_two_clients_exchange_changes() {
    let server = FakeServer::default();
    let line_a = client(&server, "line-a");
    let line_b = client(&server, "line-b");
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    line_b.on(EventKind::RemoteChanges, move |event| {
        if let SyncEvent::RemoteChanges(entries) = event {
            sink.lock().unwrap().extend(entries.iter().cloned());
        }
    });

    line_a.set_online(false);
    let payload = json!({"status": "DOWN"}).as_object().cloned().unwrap();
    line_a.enqueue(
        NewEntry::new("machine", "m-7", Operation::Update)
            .with_payload(payload)
            .with_version(0),
    );
    line_a.set_online(true);
    assert!(wait_until(|| line_a.queue_size() == 0 && !line_a.is_syncing()).await);

    line_b.sync().await.unwrap();
    {
        let changes = changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0]["entity_id"], json!("m-7"));
        assert_eq!(changes[0]["payload"]["status"], json!("DOWN"));
    }

    // Nothing new: the watermark keeps the second pull empty.
    line_b.sync().await.unwrap();
    assert_eq!(changes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stale_version_reports_conflict() {
    let server = FakeServer::default();
    let line_a = client(&server, "line-a");
    let line_b = client(&server, "line-b");
    let conflicts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&conflicts);
    line_b.on(EventKind::Conflict, move |event| {
        if let SyncEvent::Conflict(info) = event {
            sink.lock().unwrap().push(info.clone());
        }
    });
    let results = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&results);
    line_b.on(EventKind::SyncComplete, move |event| {
        if let SyncEvent::SyncComplete(result) = event {
            sink.lock().unwrap().push(result.clone());
        }
    });

    // Both lines edit plan p-1 from version 1; line B also touches p-2.
    line_a.enqueue(NewEntry::new("production_plan", "p-1", Operation::Update).with_version(1));
    assert!(wait_until(|| line_a.queue_size() == 0 && !line_a.is_syncing()).await);

    line_b.set_online(false);
    line_b.enqueue(NewEntry::new("production_plan", "p-1", Operation::Update).with_version(1));
    line_b.enqueue(NewEntry::new("production_plan", "p-2", Operation::Insert));
    line_b.set_online(true);
    assert!(wait_until(|| results.lock().unwrap().len() == 1).await);

    let result = results.lock().unwrap()[0].clone();
    assert_eq!((result.applied, result.conflicted), (1, 1));
    assert_eq!(line_b.queue_size(), 0);
    assert_eq!(server.version_of("production_plan", "p-1"), Some(2));

    let conflicts = conflicts.lock().unwrap();
    assert_eq!(
        *conflicts,
        vec![ConflictInfo {
            sync_id: "sync-1".into(),
            entity_type: "production_plan".into(),
            entity_id: "p-1".into(),
            client_version: 1,
            server_version: 2,
        }]
    );
}

#[tokio::test]
async fn test_unreachable_server_keeps_queue() {
    let config = test_config().with_max_retries(2);
    let manager = SyncManager::with_transport_and_clock(
        config,
        Unreachable,
        Arc::new(FixedClock::new(test_now())),
    );
    let events = record_all(&manager);
    manager.set_online(false);
    manager.enqueue(make_new_entry("1"));

    manager.set_online(true);
    assert!(wait_until(|| manager.queue().first().is_some_and(|e| e.retry_count == 1)
        && !manager.is_syncing())
    .await);
    assert!(manager.sync().await.is_err());

    let queue = manager.queue();
    assert_eq!(queue.len(), 1);
    assert!(queue[0].is_exhausted());

    let errors = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, SyncEvent::SyncError { message } if message.contains("503")))
        .count();
    assert_eq!(errors, 2);
}
