// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Show client status from the state directory, without network access.

use std::path::Path;

use serde::Serialize;

use super::open_state;
use crate::cli::OutputFormat;
use crate::env;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub(crate) struct Status {
    pub client_id: String,
    pub remote: String,
    /// Where the token comes from: `env`, `config` or `missing`.
    pub token: &'static str,
    pub pending: usize,
    /// Pending entries that already failed at least once.
    pub retrying: usize,
    pub last_sync_timestamp: Option<String>,
}

pub fn run(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let status = collect(state_dir)?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Text => {
            println!("Client id: {}", status.client_id);
            println!("Remote: {}", status.remote);
            println!("Token: {}", status.token);
            if status.retrying > 0 {
                println!("Pending: {} ({} retrying)", status.pending, status.retrying);
            } else {
                println!("Pending: {}", status.pending);
            }
            println!(
                "Last sync: {}",
                status.last_sync_timestamp.as_deref().unwrap_or("never")
            );
        }
    }
    Ok(())
}

pub(crate) fn collect(state_dir: &Path) -> Result<Status> {
    let (config, mut store) = open_state(state_dir)?;
    let entries = store.queue().load()?;
    let token = if env::token().is_some() {
        "env"
    } else if config.remote.token.is_some() {
        "config"
    } else {
        "missing"
    };

    Ok(Status {
        client_id: config.remote.client_id,
        remote: config.remote.url,
        token,
        pending: entries.len(),
        retrying: entries.iter().filter(|e| e.retry_count > 0).count(),
        last_sync_timestamp: store.load_watermark()?.map(|w| w.to_string()),
    })
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
