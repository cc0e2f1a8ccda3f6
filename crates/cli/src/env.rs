// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables read by the CLI are named here with
//! typed accessor functions.

use std::path::PathBuf;

/// Environment variable names.
pub mod vars {
    /// Overrides the state directory.
    pub const FOS_SYNC_DIR: &str = "FOS_SYNC_DIR";
    /// Overrides the bearer token from `config.toml`.
    pub const FOS_SYNC_TOKEN: &str = "FOS_SYNC_TOKEN";
}

/// Returns the value of `FOS_SYNC_DIR` if set and non-empty.
pub fn state_dir() -> Option<PathBuf> {
    std::env::var(vars::FOS_SYNC_DIR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Returns the value of `FOS_SYNC_TOKEN` if set and non-empty.
pub fn token() -> Option<String> {
    std::env::var(vars::FOS_SYNC_TOKEN)
        .ok()
        .filter(|v| !v.trim().is_empty())
}
