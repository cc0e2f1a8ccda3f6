// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use fos_core::{FixedClock, NewEntry, Operation, QueuedEntry};
use serde_json::json;

use super::config::SyncManagerConfig;
use super::events::{EventKind, SyncEvent};
use super::manager::SyncManager;
use super::transport_tests::MockTransport;

/// Fixed instant used by test clocks.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
}

/// Config pointing at a dummy URL, with auto-sync off.
pub fn test_config() -> SyncManagerConfig {
    SyncManagerConfig::new("http://factory.test", "test-token").with_client_id("client-test")
}

/// Create a production log insert with the given entity id.
pub fn make_new_entry(entity_id: &str) -> NewEntry {
    let payload = json!({"quantity": 120, "machine_id": "m-1"});
    NewEntry::new("production_log", entity_id, Operation::Insert)
        .with_payload(payload.as_object().cloned().unwrap())
        .with_version(1)
}

/// Create a queued entry as it would look after `enqueue`.
pub fn make_queued_entry(id: &str, entity_id: &str) -> QueuedEntry {
    QueuedEntry::from_new(make_new_entry(entity_id), id.to_string(), test_now(), 3)
}

/// Build a manager over a mock transport with a fixed clock.
pub fn make_manager(config: SyncManagerConfig) -> (SyncManager<MockTransport>, MockTransport) {
    let transport = MockTransport::new();
    let clock = Arc::new(FixedClock::new(test_now()));
    let manager = SyncManager::with_transport_and_clock(config, transport.clone(), clock);
    (manager, transport)
}

/// Record every event of `kind` emitted by `manager`.
pub fn record_events(
    manager: &SyncManager<MockTransport>,
    kind: EventKind,
) -> Arc<Mutex<Vec<SyncEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    manager.on(kind, move |event| sink.lock().unwrap().push(event.clone()));
    seen
}

/// Let spawned background tasks run until `done` holds or a second passes.
pub async fn wait_until<F: Fn() -> bool>(done: F) -> bool {
    for _ in 0..200 {
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    done()
}
