// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending mutation queue.
//!
//! [`QueueStore`] is the in-memory ordered list owned by the sync manager.
//! [`QueueFile`] persists a queue snapshot as JSONL so a queue survives process
//! restarts: each entry is written as a single line and fsynced. Rewrites go
//! through a temp file renamed over the old one, so a failed save leaves the
//! previous snapshot in place.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use fos_core::QueuedEntry;
use tempfile::NamedTempFile;

/// Error type for queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error on line {line}: {source}")]
    Serialization {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// In-memory queue of pending mutations, in insertion order.
#[derive(Debug, Default, Clone)]
pub struct QueueStore {
    entries: Vec<QueuedEntry>,
}

impl QueueStore {
    pub fn new() -> Self {
        QueueStore::default()
    }

    /// Appends an entry to the tail and returns the new length.
    pub fn push(&mut self, entry: QueuedEntry) -> usize {
        self.entries.push(entry);
        self.entries.len()
    }

    /// Removes the entry with the given id. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Returns a copy of every queued entry.
    pub fn snapshot(&self) -> Vec<QueuedEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replaces the contents, e.g. with entries loaded from a [`QueueFile`].
    pub fn replace(&mut self, entries: Vec<QueuedEntry>) {
        self.entries = entries;
    }

    /// Increments `retry_count` on the entries whose id is in `ids`.
    ///
    /// Entries enqueued after `ids` was captured are left untouched.
    /// Returns how many entries were bumped.
    pub fn increment_retries(&mut self, ids: &HashSet<String>) -> usize {
        let mut bumped = 0;
        for entry in self.entries.iter_mut().filter(|e| ids.contains(&e.id)) {
            entry.retry_count = entry.retry_count.saturating_add(1);
            bumped += 1;
        }
        bumped
    }

    /// Removes the entries whose id is in `ids` and returns them in queue order.
    pub fn take(&mut self, ids: &HashSet<String>) -> Vec<QueuedEntry> {
        let (taken, kept) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| ids.contains(&e.id));
        self.entries = kept;
        taken
    }
}

/// JSONL file holding a queue snapshot.
pub struct QueueFile {
    /// Path to the queue file.
    path: PathBuf,
}

impl QueueFile {
    /// Create or open a queue file at the given path.
    pub fn open(path: &Path) -> QueueResult<Self> {
        // Ensure the file exists (create if not)
        OpenOptions::new().create(true).append(true).open(path)?;

        Ok(QueueFile {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. The entry is immediately persisted to disk.
    pub fn append(&mut self, entry: &QueuedEntry) -> QueueResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)
            .map_err(|source| QueueError::Serialization { line: 0, source })?;
        writeln!(file, "{}", json)?;
        file.sync_all()?;

        Ok(())
    }

    /// Read all stored entries. Blank lines are skipped.
    pub fn load(&self) -> QueueResult<Vec<QueuedEntry>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: QueuedEntry = serde_json::from_str(&line)
                .map_err(|source| QueueError::Serialization { line: idx + 1, source })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Replace the file so it holds exactly `entries`.
    pub fn save(&mut self, entries: &[QueuedEntry]) -> QueueResult<()> {
        let mut content = String::new();
        for (idx, entry) in entries.iter().enumerate() {
            let json = serde_json::to_string(entry)
                .map_err(|source| QueueError::Serialization { line: idx + 1, source })?;
            content.push_str(&json);
            content.push('\n');
        }
        write_atomic(&self.path, content.as_bytes())?;
        Ok(())
    }

    /// Remove the entry with the given id. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> QueueResult<bool> {
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.save(&entries)?;
        Ok(true)
    }
}

/// Write `contents` to a temp file next to `path`, fsync it, then rename it
/// over `path`. Readers see either the old file or the new one.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
