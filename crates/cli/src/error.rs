// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::{QueueError, SyncError, TransportError};

/// All possible errors surfaced by the `fos-sync` command line.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: no config at {0}\n  hint: run 'fos-sync init --url <url>' first")]
    NotInitialized(String),

    #[error("already initialized at {0}\n  hint: edit config.toml to change the remote")]
    AlreadyInitialized(String),

    #[error("no state directory available\n  hint: pass --dir or set FOS_SYNC_DIR")]
    NoStateDir,

    #[error("entry not found: {0}\n  hint: run 'fos-sync queue' to list pending entries")]
    EntryNotFound(String),

    #[error("no auth token configured\n  hint: set FOS_SYNC_TOKEN or add token to [remote] in config.toml")]
    MissingToken,

    #[error("state directory is locked by another fos-sync process: {0}")]
    Locked(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("sync did not run: {0}")]
    SyncSkipped(&'static str),

    #[error(transparent)]
    Core(#[from] fos_core::Error),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
