// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local id generation for queued entries and sync clients.
//!
//! Format: `{unix_millis}-{suffix}` where suffix is the first 9 hex chars of
//! SHA256(timestamp nanos, process id, per-process counter). The counter makes
//! ids minted in the same nanosecond distinct.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

const SUFFIX_LEN: usize = 9;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn random_suffix(at: &DateTime<Utc>) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let nanos = at.timestamp_nanos_opt().unwrap_or_else(|| at.timestamp_micros());
    let input = format!("{}:{}:{}", nanos, std::process::id(), seq);
    let hash = Sha256::digest(input.as_bytes());
    let mut suffix = hex::encode(&hash[..5]);
    suffix.truncate(SUFFIX_LEN);
    suffix
}

/// Generate a queue entry id from the creation time.
pub fn generate_entry_id(created_at: &DateTime<Utc>) -> String {
    format!("{}-{}", created_at.timestamp_millis(), random_suffix(created_at))
}

/// Generate a sync client id, used when the caller does not supply one.
pub fn generate_client_id(created_at: &DateTime<Utc>) -> String {
    format!("client-{}-{}", created_at.timestamp_millis(), random_suffix(created_at))
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
