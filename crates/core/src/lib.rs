// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fos-core: Shared library for the FactoryOS offline sync client
//!
//! This crate provides the data model, wire protocol and small primitives
//! (ids, clocks) used by the `fos-sync` client library and CLI. It performs
//! no I/O.

pub mod clock;
pub mod entry;
pub mod error;
pub mod id;
pub mod protocol;

pub use clock::{ClockSource, FixedClock, SystemClock, Watermark};
pub use entry::{NewEntry, Operation, Payload, QueuedEntry, SyncResult};
pub use error::{Error, Result};
pub use protocol::{ConflictInfo, PullRequest, PullResponse, PushRequest, PushResponse, WireEntry};
