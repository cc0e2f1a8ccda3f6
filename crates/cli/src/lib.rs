// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fos_sync - Offline mutation sync for FactoryOS clients.
//!
//! This crate provides the sync library behind the `fos-sync` CLI tool:
//! a queue of pending local mutations reconciled with the FactoryOS sync
//! endpoints in push-then-pull cycles.
//!
//! # Main Components
//!
//! - [`SyncManager`](sync::SyncManager) - Queue, sync cycles, auto-sync and events
//! - [`Transport`](sync::Transport) - Seam for the HTTP transport and test doubles
//! - [`Config`] - File configuration in `<state dir>/config.toml`
//! - [`Error`] - Error types for CLI operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use fos_core::{NewEntry, Operation};
//! use fos_sync::sync::{EventKind, SyncManager, SyncManagerConfig};
//!
//! let config = SyncManagerConfig::new("https://factory.example.com", token)
//!     .on_conflict(|c| eprintln!("conflict on {}", c.entity_id));
//! let manager = SyncManager::new(config)?;
//! manager.on(EventKind::QueueChanged, |e| println!("{e:?}"));
//!
//! manager.set_online(false);
//! manager.enqueue(NewEntry::new("downtime_event", "7", Operation::Update));
//! manager.set_online(true); // starts a background cycle
//! ```

mod cli;
mod commands;
mod env;
mod state;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat};
pub use config::{resolve_state_dir, Config, RemoteConfig};
pub use error::{Error, Result};
pub use state::StateStore;

use clap::CommandFactory;
use clap_complete::generate;

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    if let Command::Completion { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "fos-sync", &mut std::io::stdout());
        return Ok(());
    }

    let state_dir = resolve_state_dir(cli.dir.as_deref())?;
    tracing::debug!(dir = %state_dir.display(), "using state directory");

    match cli.command {
        Command::Init {
            url,
            token,
            client_id,
        } => commands::init::run(&state_dir, &url, token, client_id),
        Command::Enqueue {
            entity_type,
            entity_id,
            operation,
            payload,
            version,
        } => commands::queue::enqueue(
            &state_dir,
            &entity_type,
            &entity_id,
            &operation,
            payload.as_deref(),
            version,
        ),
        Command::Queue { output } => commands::queue::list(&state_dir, output),
        Command::Dequeue { id } => commands::queue::dequeue(&state_dir, &id),
        Command::Sync { output } => commands::sync::run(&state_dir, output),
        Command::Watch { interval_ms } => commands::sync::watch(&state_dir, interval_ms),
        Command::Status { output } => commands::status::run(&state_dir, output),
        Command::Completion { .. } => Ok(()),
    }
}
