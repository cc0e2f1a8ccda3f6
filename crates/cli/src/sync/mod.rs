// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline mutation sync for FactoryOS clients.
//!
//! Queues local mutations and reconciles them with the FactoryOS sync
//! endpoints in push-then-pull cycles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Manager   │────►│  Transport  │────►│  /sync/push │
//! │(SyncManager)│◄────│   (trait)   │◄────│  /sync/pull │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!    │      │
//!    ▼      ▼
//! ┌──────┐ ┌──────────┐
//! │Queue │ │ EventBus │  (queueChanged, syncStart, syncComplete, ...)
//! └──────┘ └──────────┘
//! ```
//!
//! # Features
//!
//! - In-memory ordered queue, with a JSONL file for persistence across runs
//! - Single-flight push-then-pull cycles
//! - Auto-sync timer and sync on reconnect
//! - Retry accounting per submitted entry, with an `entryDropped` event
//! - Injectable transport trait for testing

mod config;
mod events;
mod manager;
mod queue;
mod timer;
mod transport;

pub use config::{
    Callback, SyncCallbacks, SyncManagerConfig, DEFAULT_ENTITY_TYPES, DEFAULT_MAX_RETRIES,
    DEFAULT_SYNC_INTERVAL,
};
pub use events::{EventBus, EventKind, Subscription, SyncEvent};
pub use manager::{SyncError, SyncManager, SyncManagerResult};
pub use queue::{QueueError, QueueFile, QueueResult, QueueStore};
pub(crate) use queue::write_atomic;
pub use timer::AutoSyncTimer;
pub use transport::{
    normalize_base_url, HttpTransport, Transport, TransportError, TransportFuture,
    TransportResult, DEFAULT_REQUEST_TIMEOUT,
};

#[cfg(test)]
mod test_helpers;


#[cfg(test)]
mod integration_tests;
