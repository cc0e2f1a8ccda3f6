// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync manager: owns the pending queue and runs push-then-pull cycles.
//!
//! Provides a high-level interface for:
//! - Queueing local mutations while offline or online
//! - Pushing the queue and pulling remote changes in one cycle
//! - Auto-sync on a timer and on reconnect
//! - Lifecycle notifications through callbacks and the event bus
//!
//! At most one cycle runs at a time per manager. Every entry point that can
//! start a cycle goes through [`SyncManager::sync`], which returns `Ok(None)`
//! when another cycle holds the flag.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use fos_core::clock::Watermark;
use fos_core::id::{generate_client_id, generate_entry_id};
use fos_core::protocol::EPOCH_WATERMARK;
use fos_core::{
    ClockSource, ConflictInfo, NewEntry, PullRequest, PushRequest, PushResponse, QueuedEntry,
    SyncResult, SystemClock,
};
use tokio_util::sync::CancellationToken;

use super::config::SyncManagerConfig;
use super::events::{guarded, EventBus, EventKind, Subscription, SyncEvent};
use super::queue::QueueStore;
use super::timer::AutoSyncTimer;
use super::transport::{HttpTransport, Transport, TransportError};

/// Error type for sync manager operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The push request failed; the cycle was aborted before pulling.
    #[error("push failed: {0}")]
    Push(#[source] TransportError),

    /// The manager was destroyed while the cycle was in flight.
    #[error("sync cancelled: manager destroyed")]
    Cancelled,

    /// The transport could not be built.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for sync manager operations.
pub type SyncManagerResult<T> = Result<T, SyncError>;

/// Offline-first sync manager.
///
/// Cloning yields another handle to the same manager.
pub struct SyncManager<T: Transport = HttpTransport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T: Transport> {
    config: SyncManagerConfig,
    client_id: String,
    transport: T,
    clock: Arc<dyn ClockSource>,
    queue: Mutex<QueueStore>,
    online: AtomicBool,
    syncing: AtomicBool,
    destroyed: AtomicBool,
    /// Watermark of the last successful pull.
    last_sync: Mutex<Option<Watermark>>,
    events: EventBus,
    timer: Mutex<AutoSyncTimer>,
    cancel: CancellationToken,
}

impl<T: Transport> Clone for SyncManager<T> {
    fn clone(&self) -> Self {
        SyncManager {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Holds the single-flight flag for the duration of one cycle.
struct SyncingGuard<'a>(&'a AtomicBool);

impl<'a> SyncingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncingGuard(flag))
    }
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncManager<HttpTransport> {
    /// Create a manager talking HTTP to `config.base_url`.
    pub fn new(config: SyncManagerConfig) -> SyncManagerResult<Self> {
        let transport =
            HttpTransport::with_timeout(&config.base_url, &config.token, config.request_timeout)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport + 'static> SyncManager<T> {
    /// Create a manager with a custom transport (for testing).
    pub fn with_transport(config: SyncManagerConfig, transport: T) -> Self {
        Self::with_transport_and_clock(config, transport, Arc::new(SystemClock))
    }

    /// Create a manager with a custom transport and clock.
    pub fn with_transport_and_clock(
        config: SyncManagerConfig,
        transport: T,
        clock: Arc<dyn ClockSource>,
    ) -> Self {
        let client_id = config
            .client_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| generate_client_id(&clock.now()));
        let auto_sync = config.auto_sync;

        let manager = SyncManager {
            inner: Arc::new(Inner {
                config,
                client_id,
                transport,
                clock,
                queue: Mutex::new(QueueStore::new()),
                online: AtomicBool::new(true),
                syncing: AtomicBool::new(false),
                destroyed: AtomicBool::new(false),
                last_sync: Mutex::new(None),
                events: EventBus::new(),
                timer: Mutex::new(AutoSyncTimer::new()),
                cancel: CancellationToken::new(),
            }),
        };

        if auto_sync {
            manager.start_auto_sync();
        }
        manager
    }

    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    pub fn config(&self) -> &SyncManagerConfig {
        &self.inner.config
    }

    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::Acquire)
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.syncing.load(Ordering::Acquire)
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Watermark of the last successful pull, if any.
    pub fn last_sync_timestamp(&self) -> Option<Watermark> {
        self.lock_last_sync().clone()
    }

    /// Queue a mutation and return its generated id.
    ///
    /// When online and idle this also starts a background cycle; the caller
    /// does not wait for it. A destroyed manager queues nothing.
    pub fn enqueue(&self, entry: NewEntry) -> String {
        let now = self.inner.clock.now();
        let id = generate_entry_id(&now);
        if self.is_destroyed() {
            tracing::warn!(id = %id, "manager destroyed; entry not queued");
            return id;
        }
        let queued = QueuedEntry::from_new(entry, id.clone(), now, self.inner.config.max_retries);

        let size = self.lock_queue().push(queued);
        tracing::debug!(id = %id, size, "entry enqueued");
        self.emit(SyncEvent::QueueChanged { size });

        if self.is_online() && !self.is_syncing() {
            self.spawn_sync("enqueue");
        }
        id
    }

    /// Remove a queued entry (undo). Returns whether it was present.
    pub fn dequeue(&self, entry_id: &str) -> bool {
        let (removed, size) = {
            let mut queue = self.lock_queue();
            (queue.remove(entry_id), queue.len())
        };
        if removed {
            tracing::debug!(id = %entry_id, size, "entry dequeued");
            self.emit(SyncEvent::QueueChanged { size });
        }
        removed
    }

    /// Copy of the pending entries, in queue order.
    pub fn queue(&self) -> Vec<QueuedEntry> {
        self.lock_queue().snapshot()
    }

    pub fn queue_size(&self) -> usize {
        self.lock_queue().len()
    }

    /// Replace the queue with previously persisted entries.
    pub fn restore_queue(&self, entries: Vec<QueuedEntry>) {
        let size = {
            let mut queue = self.lock_queue();
            queue.replace(entries);
            queue.len()
        };
        self.emit(SyncEvent::QueueChanged { size });
    }

    /// Seed the pull watermark from persisted state. Never moves it backwards.
    pub fn restore_watermark(&self, watermark: Watermark) {
        self.advance_watermark(watermark);
    }

    /// Set the network state.
    ///
    /// Going online with a non-empty queue starts a cycle. Going offline does
    /// not cancel a cycle already in flight. Setting the current state again
    /// does nothing.
    pub fn set_online(&self, online: bool) {
        let was_online = self.inner.online.swap(online, Ordering::AcqRel);
        if was_online == online {
            return;
        }

        tracing::info!(online, "network state changed");
        if !self.is_destroyed() {
            if let Some(cb) = &self.inner.config.callbacks.on_online_change {
                guarded("onOnlineChange", || cb(&online));
            }
        }
        self.emit(SyncEvent::OnlineChange { online });

        if online && self.queue_size() > 0 {
            self.spawn_sync("online");
        }
    }

    /// Register a listener. See [`EventBus::on`].
    pub fn on<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        self.inner.events.on(kind, callback)
    }

    /// Start the auto-sync timer. Returns false if one is already running.
    pub fn start_auto_sync(&self) -> bool {
        if self.is_destroyed() {
            return false;
        }

        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.config.sync_interval;
        let started = self.lock_timer().start(period, move || {
            let manager = SyncManager {
                inner: weak.upgrade()?,
            };
            if manager.is_destroyed() {
                return None;
            }
            Some(async move {
                if manager.is_online() {
                    if let Err(e) = manager.sync().await {
                        tracing::debug!(error = %e, "auto-sync cycle failed");
                    }
                }
            })
        });

        if started {
            tracing::debug!(interval_ms = period.as_millis() as u64, "auto-sync started");
        }
        started
    }

    /// Stop the auto-sync timer. Safe to call when none is running.
    pub fn stop_auto_sync(&self) -> bool {
        self.lock_timer().stop()
    }

    /// Tear the manager down.
    ///
    /// Cancels any in-flight cycle, stops the timer, clears the queue and all
    /// listeners. No callback or event fires afterwards.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.cancel.cancel();
        self.stop_auto_sync();
        self.lock_queue().clear();
        self.inner.events.clear();
        tracing::info!(client_id = %self.inner.client_id, "sync manager destroyed");
    }

    /// Run one push-then-pull cycle.
    ///
    /// Returns `Ok(None)` without touching the network when offline, destroyed,
    /// or when another cycle is in flight. A push failure bumps the retry count
    /// of the submitted entries and is returned as an error; pull failures are
    /// logged and otherwise ignored.
    pub async fn sync(&self) -> SyncManagerResult<Option<SyncResult>> {
        if self.is_destroyed() || !self.is_online() {
            return Ok(None);
        }
        let Some(_guard) = SyncingGuard::acquire(&self.inner.syncing) else {
            tracing::debug!("sync already in flight");
            return Ok(None);
        };

        self.notify_sync_start();

        let cancel = self.inner.cancel.clone();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SyncError::Cancelled),
            outcome = self.run_cycle() => outcome,
        };

        match outcome {
            Ok(result) => {
                tracing::info!(
                    applied = result.applied,
                    conflicted = result.conflicted,
                    rejected = result.rejected,
                    "sync complete"
                );
                self.notify_sync_complete(&result);
                Ok(Some(result))
            }
            Err(SyncError::Cancelled) => Err(SyncError::Cancelled),
            Err(e) => {
                tracing::warn!(error = %e, "sync failed");
                self.notify_sync_error(&e);
                Err(e)
            }
        }
    }

    async fn run_cycle(&self) -> SyncManagerResult<SyncResult> {
        let submitted = self.lock_queue().snapshot();
        let mut result = SyncResult::empty(self.inner.clock.now());

        if !submitted.is_empty() {
            let response = self.push(&submitted).await?;
            result.applied = response.applied;
            result.conflicted = response.conflicted;
            result.rejected = response.rejected;
        }

        self.pull().await;

        result.timestamp = self.inner.clock.now();
        Ok(result)
    }

    async fn push(&self, submitted: &[QueuedEntry]) -> SyncManagerResult<PushResponse> {
        let ids: HashSet<String> = submitted.iter().map(|e| e.id.clone()).collect();
        let request = PushRequest {
            client_id: self.inner.client_id.clone(),
            entries: submitted.iter().map(QueuedEntry::to_wire).collect(),
        };
        tracing::debug!(entries = request.entries.len(), "pushing queue");

        let response = match self.inner.transport.push(request).await {
            Ok(response) => response,
            Err(e) => {
                let bumped = self.lock_queue().increment_retries(&ids);
                tracing::debug!(bumped, "push failed; retry counts incremented");
                return Err(SyncError::Push(e));
            }
        };

        for conflict in &response.conflicts {
            self.notify_conflict(conflict);
        }

        let (removed, size) = {
            let mut queue = self.lock_queue();
            let removed = queue.take(&ids);
            (removed, queue.len())
        };
        for entry in removed.iter().filter(|e| e.is_exhausted()) {
            tracing::warn!(
                id = %entry.id,
                entity_type = %entry.entity_type,
                entity_id = %entry.entity_id,
                retries = entry.retry_count,
                "dropping entry after exhausting retries"
            );
            self.emit(SyncEvent::EntryDropped(entry.clone()));
        }
        if !removed.is_empty() {
            self.emit(SyncEvent::QueueChanged { size });
        }

        Ok(response)
    }

    async fn pull(&self) {
        let last_sync_timestamp = self
            .last_sync_timestamp()
            .map(|w| w.as_str().to_string())
            .unwrap_or_else(|| EPOCH_WATERMARK.to_string());
        let request = PullRequest {
            client_id: self.inner.client_id.clone(),
            entity_types: self.inner.config.entity_types.clone(),
            last_sync_timestamp,
        };

        let response = match self.inner.transport.pull(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "pull failed; ignoring until next cycle");
                return;
            }
        };

        match Watermark::parse(&response.sync_timestamp) {
            Ok(watermark) => self.advance_watermark(watermark),
            Err(e) => {
                tracing::debug!(error = %e, "pull returned an unusable watermark; keeping the old one");
            }
        }

        if !response.entries.is_empty() {
            tracing::debug!(count = response.entries.len(), "remote changes received");
            self.emit(SyncEvent::RemoteChanges(response.entries));
        }
    }

    fn advance_watermark(&self, watermark: Watermark) {
        let mut last = self.lock_last_sync();
        if last.as_ref().map_or(true, |current| watermark.is_after(current)) {
            *last = Some(watermark);
        }
    }

    /// Start a cycle in the background if a tokio runtime is available.
    fn spawn_sync(&self, trigger: &'static str) {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let manager = self.clone();
                runtime.spawn(async move {
                    if let Err(e) = manager.sync().await {
                        tracing::debug!(trigger, error = %e, "background sync failed");
                    }
                });
            }
            Err(_) => {
                tracing::debug!(trigger, "no tokio runtime; background sync skipped");
            }
        }
    }

    fn emit(&self, event: SyncEvent) {
        if !self.is_destroyed() {
            self.inner.events.emit(&event);
        }
    }

    fn notify_sync_start(&self) {
        if self.is_destroyed() {
            return;
        }
        if let Some(cb) = &self.inner.config.callbacks.on_sync_start {
            guarded("onSyncStart", || cb());
        }
        self.emit(SyncEvent::SyncStart);
    }

    fn notify_sync_complete(&self, result: &SyncResult) {
        if self.is_destroyed() {
            return;
        }
        if let Some(cb) = &self.inner.config.callbacks.on_sync_complete {
            guarded("onSyncComplete", || cb(result));
        }
        self.emit(SyncEvent::SyncComplete(result.clone()));
    }

    fn notify_sync_error(&self, error: &SyncError) {
        if self.is_destroyed() {
            return;
        }
        if let Some(cb) = &self.inner.config.callbacks.on_sync_error {
            guarded("onSyncError", || cb(error));
        }
        self.emit(SyncEvent::SyncError {
            message: error.to_string(),
        });
    }

    fn notify_conflict(&self, conflict: &ConflictInfo) {
        if self.is_destroyed() {
            return;
        }
        tracing::info!(
            entity_type = %conflict.entity_type,
            entity_id = %conflict.entity_id,
            client_version = conflict.client_version,
            server_version = conflict.server_version,
            "version conflict"
        );
        if let Some(cb) = &self.inner.config.callbacks.on_conflict {
            guarded("onConflict", || cb(conflict));
        }
        self.emit(SyncEvent::Conflict(conflict.clone()));
    }

    fn lock_queue(&self) -> MutexGuard<'_, QueueStore> {
        self.inner.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_last_sync(&self) -> MutexGuard<'_, Option<Watermark>> {
        self.inner.last_sync.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_timer(&self) -> MutexGuard<'_, AutoSyncTimer> {
        self.inner.timer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Transport + 'static> std::fmt::Debug for SyncManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncManager")
            .field("client_id", &self.inner.client_id)
            .field("online", &self.is_online())
            .field("syncing", &self.is_syncing())
            .field("queue_size", &self.queue_size())
            .finish()
    }
}
