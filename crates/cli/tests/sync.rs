// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const PUSH_PATH: &str = "/api/v1/sync/push";
const PULL_PATH: &str = "/api/v1/sync/pull";
const WATERMARK: &str = "2026-01-10T12:05:00.000Z";

/// Mock FactoryOS server. Only requests carrying `token` are answered;
/// anything else falls through to wiremock's 404.
async fn factory(token: &str, push: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    let bearer = format!("Bearer {}", token);
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .and(header("authorization", bearer.as_str()))
        .respond_with(push)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PULL_PATH))
        .and(header("authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [{ "entity_type": "machine", "id": "m-9" }],
            "syncTimestamp": WATERMARK,
        })))
        .mount(&server)
        .await;
    server
}

fn applied(count: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "applied": count, "conflicted": 0, "rejected": 0,
    }))
}

async fn requests_to(server: &MockServer, endpoint: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == endpoint)
        .collect()
}

fn queue_json(state: &TempDir) -> Vec<Value> {
    let output = fos(state).args(["queue", "-o", "json"]).output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn pushes_queue_then_pulls() {
    let server = factory("test-token", applied(1)).await;
    let state = init_state(&server.uri());
    enqueue(
        &state,
        &["downtime_event", "7", "UPDATE", "-p", r#"{"reason":"jam"}"#, "--version", "2"],
    );

    fos(&state)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced: 1 applied, 0 conflicted, 0 rejected"))
        .stdout(predicate::str::contains("Pending: 0"))
        .stdout(predicate::str::contains(format!("Last sync: {}", WATERMARK)));

    let paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(paths, vec![PUSH_PATH, PULL_PATH]);

    let push: Value = requests_to(&server, PUSH_PATH).await[0].body_json().unwrap();
    assert_eq!(push["client_id"], "client-test");
    assert_eq!(push["entries"][0]["entity_type"], "downtime_event");
    assert_eq!(push["entries"][0]["operation"], "UPDATE");
    assert_eq!(push["entries"][0]["version"], 2);
    assert!(push["entries"][0].get("retry_count").is_none());

    let pull: Value = requests_to(&server, PULL_PATH).await[0].body_json().unwrap();
    assert_eq!(pull["last_sync_timestamp"], "1970-01-01T00:00:00.000Z");

    assert!(queue_json(&state).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn watermark_carries_to_next_run() {
    let server = factory("test-token", applied(0)).await;
    let state = init_state(&server.uri());

    fos(&state).arg("sync").assert().success();
    fos(&state).arg("sync").assert().success();

    let pulls = requests_to(&server, PULL_PATH).await;
    assert_eq!(pulls.len(), 2);
    let second: Value = pulls[1].body_json().unwrap();
    assert_eq!(second["last_sync_timestamp"], WATERMARK);

    fos(&state)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Last sync: {}", WATERMARK)));
}

#[tokio::test(flavor = "multi_thread")]
async fn watermark_is_echoed_verbatim() {
    let server = MockServer::start().await;
    Mock::given(path(PULL_PATH))
        .and(body_partial_json(json!({ "last_sync_timestamp": "1970-01-01T00:00:00.000Z" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [],
            "syncTimestamp": "2026-01-10T12:00:00.123456Z",
        })))
        .mount(&server)
        .await;
    Mock::given(path(PULL_PATH))
        .and(body_partial_json(json!({ "last_sync_timestamp": "2026-01-10T12:00:00.123456Z" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [],
            "syncTimestamp": "2026-01-10T12:00:00.123456Z",
        })))
        .expect(1)
        .mount(&server)
        .await;
    let state = init_state(&server.uri());

    fos(&state).arg("sync").assert().success();
    fos(&state)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Last sync: 2026-01-10T12:00:00.123456Z"));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_push_keeps_entry_and_counts_retry() {
    let server = factory(
        "test-token",
        ResponseTemplate::new(500).set_body_json(json!({ "error": "database unavailable" })),
    )
    .await;
    let state = init_state(&server.uri());
    let id = enqueue(&state, &["machine", "m-1", "DELETE"]);

    fos(&state)
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("500"));

    // No pull after a failed push.
    assert!(requests_to(&server, PULL_PATH).await.is_empty());

    let entries = queue_json(&state);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], Value::String(id));
    assert_eq!(entries[0]["retry_count"], 1);

    fos(&state)
        .arg("queue")
        .assert()
        .success()
        .stdout(predicate::str::contains("retries 1/3"));
}

#[tokio::test(flavor = "multi_thread")]
async fn conflicts_are_reported() {
    let server = factory(
        "test-token",
        ResponseTemplate::new(200).set_body_json(json!({
            "applied": 0, "conflicted": 1, "rejected": 0,
            "conflicts": [{
                "sync_id": 17, "entity_type": "production_plan", "entity_id": "p-1",
                "client_version": 1, "server_version": 2,
            }],
        })),
    )
    .await;
    let state = init_state(&server.uri());
    enqueue(&state, &["production_plan", "p-1", "UPDATE", "--version", "1"]);

    let output = fos(&state).args(["sync", "-o", "json"]).output().unwrap();
    assert!(output.status.success());
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(summary["conflicted"], 1);
    assert_eq!(summary["remaining"], 0);
    assert_eq!(summary["conflicts"][0]["sync_id"], "17");
    assert_eq!(summary["conflicts"][0]["server_version"], 2);
}

#[test]
fn missing_token_fails_before_network() {
    let temp = TempDir::new().unwrap();
    fos(&temp)
        .args(["init", "--url", "http://127.0.0.1:9"])
        .assert()
        .success();

    fos(&temp)
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no auth token"))
        .stderr(predicate::str::contains("FOS_SYNC_TOKEN"));
}

#[tokio::test(flavor = "multi_thread")]
async fn env_token_is_sent_as_bearer() {
    let server = factory("from-env", applied(0)).await;
    let temp = TempDir::new().unwrap();
    fos(&temp)
        .args(["init", "--url", &server.uri(), "--token", "from-config"])
        .assert()
        .success();

    fos(&temp)
        .arg("sync")
        .env("FOS_SYNC_TOKEN", "from-env")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Last sync: {}", WATERMARK)));
}
