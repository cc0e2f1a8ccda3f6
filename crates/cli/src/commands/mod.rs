// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod init;
pub mod queue;
pub mod status;
pub mod sync;

use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::state::StateStore;

/// Helper to load the config and lock the state directory.
pub fn open_state(state_dir: &Path) -> Result<(Config, StateStore)> {
    let config = Config::load(state_dir)?;
    let store = StateStore::open(state_dir)?;
    Ok((config, store))
}

/// Build the runtime used by the network commands.
fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
