// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline queue commands: `enqueue`, `queue` and `dequeue`.
//!
//! These never touch the network; entries wait in `queue.jsonl` for the next
//! `sync` or `watch`.

use std::path::Path;

use chrono::Utc;
use fos_core::clock::format_iso8601;
use fos_core::entry::parse_payload;
use fos_core::id::generate_entry_id;
use fos_core::{NewEntry, Operation, QueuedEntry};

use super::open_state;
use crate::cli::OutputFormat;
use crate::error::{Error, Result};

pub fn enqueue(
    state_dir: &Path,
    entity_type: &str,
    entity_id: &str,
    operation: &str,
    payload: Option<&str>,
    version: i64,
) -> Result<()> {
    let entry = build_entry(entity_type, entity_id, operation, payload, version)?;
    let queued = append(state_dir, entry)?;
    println!("{}", queued.id);
    Ok(())
}

/// Parse and validate command-line input into a [`NewEntry`].
pub(crate) fn build_entry(
    entity_type: &str,
    entity_id: &str,
    operation: &str,
    payload: Option<&str>,
    version: i64,
) -> Result<NewEntry> {
    let operation: Operation = operation.parse()?;
    let mut entry = NewEntry::new(entity_type, entity_id, operation).with_version(version);
    if let Some(json) = payload {
        entry = entry.with_payload(parse_payload(json)?);
    }
    entry.validate()?;
    Ok(entry)
}

/// Append an entry to the persisted queue.
pub(crate) fn append(state_dir: &Path, entry: NewEntry) -> Result<QueuedEntry> {
    let (config, mut store) = open_state(state_dir)?;
    let now = Utc::now();
    let queued = QueuedEntry::from_new(
        entry,
        generate_entry_id(&now),
        now,
        config.remote.max_retries,
    );
    store.queue().append(&queued)?;
    tracing::debug!(id = %queued.id, "entry appended to queue file");
    Ok(queued)
}

pub fn list(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let (_config, mut store) = open_state(state_dir)?;
    let entries = store.queue().load()?;

    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No pending entries.");
            }
            for entry in &entries {
                println!("{}", format_entry_line(entry));
            }
        }
    }
    Ok(())
}

/// One-line text rendering of a queued entry.
pub(crate) fn format_entry_line(entry: &QueuedEntry) -> String {
    let mut line = format!(
        "{}  {:<6} {}/{}  v{}  {}",
        entry.id,
        entry.operation,
        entry.entity_type,
        entry.entity_id,
        entry.version,
        format_iso8601(&entry.client_timestamp),
    );
    if entry.retry_count > 0 {
        line.push_str(&format!(
            "  retries {}/{}",
            entry.retry_count, entry.max_retries
        ));
    }
    line
}

pub fn dequeue(state_dir: &Path, id: &str) -> Result<()> {
    let (_config, mut store) = open_state(state_dir)?;
    if !store.queue().remove(id)? {
        return Err(Error::EntryNotFound(id.to_string()));
    }
    println!("Removed {}", id);
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
