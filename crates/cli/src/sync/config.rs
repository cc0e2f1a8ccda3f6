// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-process configuration for a [`SyncManager`](super::SyncManager).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use fos_core::{ConflictInfo, SyncResult};

use super::manager::SyncError;
use super::transport::DEFAULT_REQUEST_TIMEOUT;

/// Default period of the auto-sync timer.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);
/// Default retry budget for each queued entry.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Entity types pulled from the server unless configured otherwise.
pub const DEFAULT_ENTITY_TYPES: [&str; 4] =
    ["production_log", "downtime_event", "production_plan", "machine"];

/// Callback receiving a reference to an event payload.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Optional lifecycle callbacks, invoked alongside the matching bus events.
#[derive(Clone, Default)]
pub struct SyncCallbacks {
    pub on_sync_start: Option<Arc<dyn Fn() + Send + Sync>>,
    pub on_sync_complete: Option<Callback<SyncResult>>,
    pub on_sync_error: Option<Callback<SyncError>>,
    pub on_online_change: Option<Callback<bool>>,
    pub on_conflict: Option<Callback<ConflictInfo>>,
}

impl fmt::Debug for SyncCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCallbacks")
            .field("on_sync_start", &self.on_sync_start.is_some())
            .field("on_sync_complete", &self.on_sync_complete.is_some())
            .field("on_sync_error", &self.on_sync_error.is_some())
            .field("on_online_change", &self.on_online_change.is_some())
            .field("on_conflict", &self.on_conflict.is_some())
            .finish()
    }
}

/// Configuration fixed at manager construction.
#[derive(Clone)]
pub struct SyncManagerConfig {
    /// Base URL of the FactoryOS API, e.g. `https://factory.example.com`.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: String,
    /// Client id; generated at construction when absent.
    pub client_id: Option<String>,
    /// Start the auto-sync timer at construction.
    pub auto_sync: bool,
    pub sync_interval: Duration,
    pub max_retries: u32,
    /// Entity types requested on pull.
    pub entity_types: Vec<String>,
    /// Timeout applied to each HTTP request.
    pub request_timeout: Duration,
    pub callbacks: SyncCallbacks,
}

impl SyncManagerConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        SyncManagerConfig {
            base_url: base_url.into(),
            token: token.into(),
            client_id: None,
            auto_sync: false,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            entity_types: DEFAULT_ENTITY_TYPES.iter().map(|s| s.to_string()).collect(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            callbacks: SyncCallbacks::default(),
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_auto_sync(mut self, auto_sync: bool) -> Self {
        self.auto_sync = auto_sync;
        self
    }

    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_entity_types<I, S>(mut self, entity_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_types = entity_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn on_sync_start<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.on_sync_start = Some(Arc::new(f));
        self
    }

    pub fn on_sync_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&SyncResult) + Send + Sync + 'static,
    {
        self.callbacks.on_sync_complete = Some(Arc::new(f));
        self
    }

    pub fn on_sync_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&SyncError) + Send + Sync + 'static,
    {
        self.callbacks.on_sync_error = Some(Arc::new(f));
        self
    }

    pub fn on_online_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.callbacks.on_online_change = Some(Arc::new(f));
        self
    }

    pub fn on_conflict<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConflictInfo) + Send + Sync + 'static,
    {
        self.callbacks.on_conflict = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for SyncManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncManagerConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("auto_sync", &self.auto_sync)
            .field("sync_interval", &self.sync_interval)
            .field("max_retries", &self.max_retries)
            .field("entity_types", &self.entity_types)
            .field("request_timeout", &self.request_timeout)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
