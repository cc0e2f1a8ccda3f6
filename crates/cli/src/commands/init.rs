// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use chrono::Utc;
use fos_core::id::generate_client_id;

use crate::config::{config_path, Config, RemoteConfig};
use crate::error::{Error, Result};
use crate::state::StateStore;

pub fn run(
    state_dir: &Path,
    url: &str,
    token: Option<String>,
    client_id: Option<String>,
) -> Result<()> {
    let config = init(state_dir, url, token, client_id)?;
    println!("Initialized fos-sync in {}", state_dir.display());
    println!("Remote: {}", config.remote.url);
    println!("Client id: {}", config.remote.client_id);
    if config.remote.resolve_token().is_none() {
        println!();
        println!("No token configured: set FOS_SYNC_TOKEN before running 'fos-sync sync'.");
    }
    Ok(())
}

/// Write a fresh config and an empty queue into `state_dir`.
pub(crate) fn init(
    state_dir: &Path,
    url: &str,
    token: Option<String>,
    client_id: Option<String>,
) -> Result<Config> {
    let path = config_path(state_dir);
    if path.exists() {
        return Err(Error::AlreadyInitialized(path.display().to_string()));
    }

    let client_id = client_id.unwrap_or_else(|| generate_client_id(&Utc::now()));
    let config = Config {
        remote: RemoteConfig::new(url, token, client_id)?,
    };

    // Take the lock first so a concurrent init cannot interleave.
    let _store = StateStore::open(state_dir)?;
    config.save(state_dir)?;
    tracing::debug!(dir = %state_dir.display(), "state directory initialized");
    Ok(config)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
