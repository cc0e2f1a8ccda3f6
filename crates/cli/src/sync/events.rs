// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events and a minimal synchronous publish/subscribe bus.
//!
//! Listeners for an event kind run in registration order on the emitting
//! thread. Each listener runs inside its own panic boundary, so a faulty
//! subscriber is logged and skipped without starving the ones after it.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use fos_core::{ConflictInfo, QueuedEntry, SyncResult};
use serde_json::Value;

/// Names of the events a [`SyncManager`](super::SyncManager) emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    QueueChanged,
    SyncStart,
    SyncComplete,
    SyncError,
    OnlineChange,
    Conflict,
    RemoteChanges,
    EntryDropped,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [EventKind; 8] = [
        EventKind::QueueChanged,
        EventKind::SyncStart,
        EventKind::SyncComplete,
        EventKind::SyncError,
        EventKind::OnlineChange,
        EventKind::Conflict,
        EventKind::RemoteChanges,
        EventKind::EntryDropped,
    ];

    /// Get the event name (e.g., "queueChanged").
    pub fn as_event_name(&self) -> &'static str {
        match self {
            EventKind::QueueChanged => "queueChanged",
            EventKind::SyncStart => "syncStart",
            EventKind::SyncComplete => "syncComplete",
            EventKind::SyncError => "syncError",
            EventKind::OnlineChange => "onlineChange",
            EventKind::Conflict => "conflict",
            EventKind::RemoteChanges => "remoteChanges",
            EventKind::EntryDropped => "entryDropped",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_event_name())
    }
}

/// An event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The queue length changed.
    QueueChanged { size: usize },
    /// A sync cycle started.
    SyncStart,
    /// A sync cycle finished without a push failure.
    SyncComplete(SyncResult),
    /// A sync cycle failed during push.
    SyncError { message: String },
    /// The manager's online flag changed.
    OnlineChange { online: bool },
    /// The server reported a version conflict for one entry.
    Conflict(ConflictInfo),
    /// A pull returned server-side changes.
    RemoteChanges(Vec<Value>),
    /// An entry left the queue after using up its retry budget.
    EntryDropped(QueuedEntry),
}

impl SyncEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SyncEvent::QueueChanged { .. } => EventKind::QueueChanged,
            SyncEvent::SyncStart => EventKind::SyncStart,
            SyncEvent::SyncComplete(_) => EventKind::SyncComplete,
            SyncEvent::SyncError { .. } => EventKind::SyncError,
            SyncEvent::OnlineChange { .. } => EventKind::OnlineChange,
            SyncEvent::Conflict(_) => EventKind::Conflict,
            SyncEvent::RemoteChanges(_) => EventKind::RemoteChanges,
            SyncEvent::EntryDropped(_) => EventKind::EntryDropped,
        }
    }
}

type Listener = Arc<dyn Fn(&SyncEvent) + Send + Sync>;
type ListenerMap = HashMap<EventKind, Vec<(u64, Listener)>>;

/// Synchronous publish/subscribe bus keyed by [`EventKind`].
///
/// Cloning shares the same listener table.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<ListenerMap>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    /// Register `callback` for `kind`.
    ///
    /// Dropping the returned [`Subscription`] keeps the callback registered;
    /// call [`Subscription::unsubscribe`] to remove it.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            listeners: Arc::downgrade(&self.listeners),
            kind,
            id,
        }
    }

    /// Deliver `event` to every listener registered for its kind.
    ///
    /// Returns how many listeners completed without panicking. The listener
    /// table is not locked while callbacks run, so a callback may subscribe
    /// or unsubscribe; such changes apply from the next emit.
    pub fn emit(&self, event: &SyncEvent) -> usize {
        let kind = event.kind();
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        let mut delivered = 0;
        for listener in listeners {
            if guarded(kind.as_event_name(), || listener(event)) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(EventKind, usize)> = EventKind::ALL
            .iter()
            .map(|k| (*k, self.listener_count(*k)))
            .filter(|(_, n)| *n > 0)
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

/// Handle returned by [`EventBus::on`].
#[derive(Debug)]
pub struct Subscription {
    listeners: Weak<Mutex<ListenerMap>>,
    kind: EventKind,
    id: u64,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove the callback. Returns false if it was already gone (for
    /// example after the bus was cleared or dropped).
    pub fn unsubscribe(self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let mut map = listeners.lock().unwrap_or_else(|e| e.into_inner());
        let Some(list) = map.get_mut(&self.kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(id, _)| *id != self.id);
        list.len() != before
    }
}

/// Run `f`, containing and logging a panic. Returns false if `f` panicked.
///
/// Relies on unwinding; under `panic = "abort"` a panic still ends the process.
pub(crate) fn guarded<F: FnOnce()>(name: &str, f: F) -> bool {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!(event = name, %reason, "sync listener panicked");
            false
        }
    }
}
