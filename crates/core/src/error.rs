// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for fos-core operations.

use thiserror::Error;

/// All possible errors that can occur in fos-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid operation: '{0}'\n  hint: valid operations are: INSERT, UPDATE, DELETE")]
    InvalidOperation(String),

    #[error("invalid payload: {0}\n  hint: the payload must be a JSON object")]
    InvalidPayload(String),

    #[error("invalid timestamp: '{0}'\n  hint: timestamps use ISO-8601, e.g. 2026-01-10T12:00:00.000Z")]
    InvalidTimestamp(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for fos-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
