// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is stored in `<state dir>/config.toml` and holds the
//! `[remote]` table:
//! - `url`: base URL of the FactoryOS API
//! - `token`: bearer token (overridable through `FOS_SYNC_TOKEN`)
//! - `client_id`: stable client id, generated at `init`
//! - tuning: `sync_interval_ms`, `max_retries`, `entity_types`, `request_timeout_secs`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{
    normalize_base_url, SyncManagerConfig, DEFAULT_ENTITY_TYPES, DEFAULT_MAX_RETRIES,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_SYNC_INTERVAL,
};

const CONFIG_FILE_NAME: &str = "config.toml";
const STATE_DIR_NAME: &str = "fos-sync";

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub remote: RemoteConfig,
}

/// Remote sync configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL, `http://` or `https://`.
    pub url: String,
    /// Bearer token. May be left out when `FOS_SYNC_TOKEN` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub client_id: String,
    /// Auto-sync period in milliseconds (default: 30000).
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,
    /// Retry budget per queued entry (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Entity types requested on pull.
    #[serde(default = "default_entity_types")]
    pub entity_types: Vec<String>,
    /// Per-request HTTP timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_sync_interval_ms() -> u64 {
    DEFAULT_SYNC_INTERVAL.as_millis() as u64
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_entity_types() -> Vec<String> {
    DEFAULT_ENTITY_TYPES.iter().map(|s| s.to_string()).collect()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("client_id", &self.client_id)
            .field("sync_interval_ms", &self.sync_interval_ms)
            .field("max_retries", &self.max_retries)
            .field("entity_types", &self.entity_types)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl RemoteConfig {
    /// Creates a remote config with default tuning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the URL is not `http(s)://`.
    pub fn new(url: &str, token: Option<String>, client_id: String) -> Result<Self> {
        Ok(RemoteConfig {
            url: normalize_base_url(url)?,
            token,
            client_id,
            sync_interval_ms: default_sync_interval_ms(),
            max_retries: default_max_retries(),
            entity_types: default_entity_types(),
            request_timeout_secs: default_request_timeout_secs(),
        })
    }

    /// The token to use, with `FOS_SYNC_TOKEN` taking precedence.
    pub fn resolve_token(&self) -> Option<String> {
        env::token().or_else(|| self.token.clone())
    }
}

impl Config {
    /// Loads configuration from the given state directory.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let config_path = config_path(state_dir);
        if !config_path.is_file() {
            return Err(Error::NotInitialized(config_path.display().to_string()));
        }
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Saves configuration to the given state directory, creating it if needed.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        fs::create_dir_all(state_dir)?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(config_path(state_dir), content)?;
        Ok(())
    }

    /// Builds the in-process manager configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingToken`] when neither the file nor
    /// `FOS_SYNC_TOKEN` provides a token.
    pub fn to_manager_config(&self) -> Result<SyncManagerConfig> {
        let remote = &self.remote;
        let token = remote.resolve_token().ok_or(Error::MissingToken)?;
        Ok(SyncManagerConfig::new(&remote.url, token)
            .with_client_id(&remote.client_id)
            .with_sync_interval(Duration::from_millis(remote.sync_interval_ms))
            .with_max_retries(remote.max_retries)
            .with_entity_types(remote.entity_types.iter().cloned())
            .with_request_timeout(Duration::from_secs(remote.request_timeout_secs)))
    }
}

/// Path of `config.toml` inside a state directory.
pub fn config_path(state_dir: &Path) -> PathBuf {
    state_dir.join(CONFIG_FILE_NAME)
}

/// Resolve the state directory.
///
/// Precedence: explicit `--dir`, then `FOS_SYNC_DIR`, then the platform's
/// local data directory joined with `fos-sync`.
pub fn resolve_state_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = env::state_dir() {
        return Ok(dir);
    }
    dirs::data_local_dir()
        .map(|base| base.join(STATE_DIR_NAME))
        .ok_or(Error::NoStateDir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
