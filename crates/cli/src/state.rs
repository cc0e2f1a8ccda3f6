// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk client state: the pending queue and the pull watermark.
//!
//! Layout of a state directory:
//! - `config.toml`: see [`crate::config`]
//! - `queue.jsonl`: one pending entry per line
//! - `state.json`: `{"last_sync_timestamp": "..."}`
//! - `.lock`: held exclusively while a command touches the state

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fos_core::Watermark;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sync::{write_atomic, QueueFile, SyncManager, Transport};

const QUEUE_FILE_NAME: &str = "queue.jsonl";
const STATE_FILE_NAME: &str = "state.json";
const LOCK_FILE_NAME: &str = ".lock";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SavedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_sync_timestamp: Option<String>,
}

/// Exclusive handle on a state directory.
///
/// The lock is released when the store is dropped.
pub struct StateStore {
    dir: PathBuf,
    queue: QueueFile,
    _lock: File,
}

impl StateStore {
    /// Open the state directory, creating it if needed, and take its lock.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let lock = acquire_lock(&dir.join(LOCK_FILE_NAME))?;
        let queue = QueueFile::open(&dir.join(QUEUE_FILE_NAME))?;
        Ok(StateStore {
            dir: dir.to_path_buf(),
            queue,
            _lock: lock,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn queue(&mut self) -> &mut QueueFile {
        &mut self.queue
    }

    /// Last successful pull watermark, if one was saved.
    ///
    /// An unreadable watermark is treated as absent and logged.
    pub fn load_watermark(&self) -> Result<Option<Watermark>> {
        let path = self.dir.join(STATE_FILE_NAME);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let saved: SavedState = serde_json::from_str(&content)?;
        Ok(saved
            .last_sync_timestamp
            .and_then(|ts| match Watermark::parse(&ts) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring unreadable watermark in state.json");
                    None
                }
            }))
    }

    /// Save the watermark text as the server sent it.
    pub fn save_watermark(&self, watermark: Option<&Watermark>) -> Result<()> {
        let saved = SavedState {
            last_sync_timestamp: watermark.map(|w| w.as_str().to_string()),
        };
        let content = serde_json::to_string_pretty(&saved)?;
        write_atomic(&self.dir.join(STATE_FILE_NAME), content.as_bytes())?;
        Ok(())
    }

    /// Seed a manager with the persisted queue and watermark.
    pub fn restore_into<T: Transport + 'static>(&mut self, manager: &SyncManager<T>) -> Result<()> {
        let entries = self.queue.load()?;
        tracing::debug!(entries = entries.len(), "restoring persisted queue");
        manager.restore_queue(entries);
        if let Some(watermark) = self.load_watermark()? {
            manager.restore_watermark(watermark);
        }
        Ok(())
    }

    /// Persist a manager's queue and watermark.
    pub fn persist_from<T: Transport + 'static>(&mut self, manager: &SyncManager<T>) -> Result<()> {
        self.queue.save(&manager.queue())?;
        self.save_watermark(manager.last_sync_timestamp().as_ref())?;
        Ok(())
    }
}

fn acquire_lock(lock_path: &Path) -> Result<File> {
    use fs2::FileExt;

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(lock_path)?;
    file.try_lock_exclusive()
        .map_err(|_| Error::Locked(lock_path.display().to_string()))?;
    Ok(file)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
