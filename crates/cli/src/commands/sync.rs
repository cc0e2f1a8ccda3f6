// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network commands: a single `sync` cycle and the long-running `watch`.
//!
//! Both restore the manager from the state directory and write the queue and
//! watermark back afterwards, whether or not the cycle succeeded, so retry
//! counts survive across runs.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fos_core::clock::format_iso8601;
use fos_core::{ConflictInfo, SyncResult};
use serde::Serialize;
use tokio::sync::mpsc;

use super::{open_state, runtime};
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::state::StateStore;
use crate::sync::{EventKind, SyncEvent, SyncManager};

/// Summary printed after a cycle.
#[derive(Debug, Serialize)]
pub(crate) struct SyncSummary {
    pub applied: u64,
    pub conflicted: u64,
    pub rejected: u64,
    pub timestamp: String,
    pub remaining: usize,
    pub last_sync_timestamp: Option<String>,
    pub conflicts: Vec<ConflictInfo>,
    /// Ids of entries dropped after exhausting their retries.
    pub dropped: Vec<String>,
}

/// Conflicts and drops observed during a cycle.
#[derive(Default)]
struct Observed {
    conflicts: Vec<ConflictInfo>,
    dropped: Vec<String>,
}

fn build_manager(config: &Config, store: &mut StateStore) -> Result<SyncManager> {
    let manager = SyncManager::new(config.to_manager_config()?)?;
    store.restore_into(&manager)?;
    Ok(manager)
}

fn observe(manager: &SyncManager) -> Arc<Mutex<Observed>> {
    let observed = Arc::new(Mutex::new(Observed::default()));
    let sink = Arc::clone(&observed);
    manager.on(EventKind::Conflict, move |event| {
        if let SyncEvent::Conflict(info) = event {
            let mut observed = sink.lock().unwrap_or_else(|e| e.into_inner());
            observed.conflicts.push(info.clone());
        }
    });
    let sink = Arc::clone(&observed);
    manager.on(EventKind::EntryDropped, move |event| {
        if let SyncEvent::EntryDropped(entry) = event {
            let mut observed = sink.lock().unwrap_or_else(|e| e.into_inner());
            observed.dropped.push(entry.id.clone());
        }
    });
    observed
}

pub fn run(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let (config, mut store) = open_state(state_dir)?;
    let runtime = runtime()?;

    let (outcome, observed, remaining, watermark) = runtime.block_on(async {
        let manager = build_manager(&config, &mut store)?;
        let observed = observe(&manager);
        let outcome = manager.sync().await;
        store.persist_from(&manager)?;
        let remaining = manager.queue_size();
        let watermark = manager.last_sync_timestamp();
        manager.destroy();
        let observed = std::mem::take(&mut *observed.lock().unwrap_or_else(|e| e.into_inner()));
        Ok::<_, Error>((outcome, observed, remaining, watermark))
    })?;

    let result = outcome?.ok_or(Error::SyncSkipped("another cycle is in flight"))?;
    let summary = summarize(
        &result,
        remaining,
        watermark.map(|w| w.to_string()),
        observed,
    );

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&summary),
    }
    Ok(())
}

fn summarize(
    result: &SyncResult,
    remaining: usize,
    last_sync_timestamp: Option<String>,
    observed: Observed,
) -> SyncSummary {
    SyncSummary {
        applied: result.applied,
        conflicted: result.conflicted,
        rejected: result.rejected,
        timestamp: format_iso8601(&result.timestamp),
        remaining,
        last_sync_timestamp,
        conflicts: observed.conflicts,
        dropped: observed.dropped,
    }
}

pub(crate) fn format_summary(summary: &SyncSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Synced: {} applied, {} conflicted, {} rejected",
        summary.applied, summary.conflicted, summary.rejected
    )];
    for conflict in &summary.conflicts {
        lines.push(format!(
            "  conflict: {}/{} (client v{}, server v{})",
            conflict.entity_type, conflict.entity_id, conflict.client_version, conflict.server_version
        ));
    }
    for id in &summary.dropped {
        lines.push(format!("  dropped after max retries: {}", id));
    }
    lines.push(format!("Pending: {}", summary.remaining));
    lines.push(format!(
        "Last sync: {}",
        summary.last_sync_timestamp.as_deref().unwrap_or("never")
    ));
    lines
}

fn print_summary(summary: &SyncSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

/// Sync on a timer until Ctrl-C.
pub fn watch(state_dir: &Path, interval_ms: Option<u64>) -> Result<()> {
    let (mut config, mut store) = open_state(state_dir)?;
    if let Some(ms) = interval_ms {
        config.remote.sync_interval_ms = ms;
    }
    let runtime = runtime()?;

    runtime.block_on(async {
        let manager = build_manager(&config, &mut store)?;
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let complete_tx = tx.clone();
        manager.on(EventKind::SyncComplete, move |event| {
            if let SyncEvent::SyncComplete(result) = event {
                let _ = complete_tx.send(format!(
                    "{} synced: {} applied, {} conflicted, {} rejected",
                    format_iso8601(&result.timestamp),
                    result.applied,
                    result.conflicted,
                    result.rejected
                ));
            }
        });
        manager.on(EventKind::SyncError, move |event| {
            if let SyncEvent::SyncError { message } = event {
                let _ = tx.send(format!("sync error: {}", message));
            }
        });

        println!(
            "Watching {} every {} ms (Ctrl-C to stop)",
            config.remote.url, config.remote.sync_interval_ms
        );
        if let Err(e) = manager.sync().await {
            tracing::debug!(error = %e, "initial cycle failed");
        }
        manager.start_auto_sync();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                line = rx.recv() => {
                    let Some(line) = line else { break };
                    println!("{}", line);
                    store.persist_from(&manager)?;
                }
            }
        }

        manager.stop_auto_sync();
        // Wait up to 5s for an in-flight cycle before the final save.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while manager.is_syncing() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        store.persist_from(&manager)?;
        manager.destroy();
        println!("Stopped; {} pending", store.queue().load()?.len());
        Ok::<(), Error>(())
    })
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
