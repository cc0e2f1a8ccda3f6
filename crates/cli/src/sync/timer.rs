// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Repeating background timer used for auto-sync.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Shortest accepted period; tokio intervals reject zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A single repeating timer running on the current tokio runtime.
///
/// The first tick fires one full period after [`start`](Self::start).
#[derive(Debug, Default)]
pub struct AutoSyncTimer {
    handle: Option<JoinHandle<()>>,
}

impl AutoSyncTimer {
    pub fn new() -> Self {
        AutoSyncTimer::default()
    }

    /// Check whether a timer task is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start calling `tick` every `period`.
    ///
    /// Each call returns the work for that tick, or `None` to end the timer.
    /// Ticks never overlap: a slow tick delays the next one. Returns false if
    /// a timer is already running or there is no tokio runtime.
    pub fn start<F, Fut>(&mut self, period: Duration, mut tick: F) -> bool
    where
        F: FnMut() -> Option<Fut> + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_running() {
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("no tokio runtime available; auto-sync timer not started");
                return false;
            }
        };

        let period = period.max(MIN_PERIOD);
        self.handle = Some(runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match tick() {
                    Some(work) => work.await,
                    None => break,
                }
            }
            tracing::debug!("auto-sync timer finished");
        }));
        true
    }

    /// Stop the timer. Safe to call when none is running.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for AutoSyncTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
