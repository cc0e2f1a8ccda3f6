// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for the sync endpoints.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTP calls for production
//! - Mock transports for unit testing

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use fos_core::protocol::{PULL_PATH, PUSH_PATH};
use fos_core::{PullRequest, PullResponse, PushRequest, PushResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Default per-request timeout for [`HttpTransport`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport could not be built from its configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfiguration(String),

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Transport trait for the push/pull endpoints.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send + Sync {
    /// Submit queued entries.
    fn push(&self, request: PushRequest) -> TransportFuture<'_, PushResponse>;

    /// Fetch server-side changes since a watermark.
    fn pull(&self, request: PullRequest) -> TransportFuture<'_, PullResponse>;
}

/// HTTP transport implementation using reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    push_url: String,
    pull_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for `base_url` with the default request timeout.
    pub fn new(base_url: &str, token: &str) -> TransportResult<Self> {
        Self::with_timeout(base_url, token, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a transport whose requests give up after `timeout`.
    pub fn with_timeout(base_url: &str, token: &str, timeout: Duration) -> TransportResult<Self> {
        let base = normalize_base_url(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfiguration(e.to_string()))?;

        Ok(HttpTransport {
            push_url: format!("{base}{PUSH_PATH}"),
            pull_url: format!("{base}{PULL_PATH}"),
            token: token.to_string(),
            client,
        })
    }

    pub fn push_url(&self) -> &str {
        &self.push_url
    }

    pub fn pull_url(&self) -> &str {
        &self.pull_url
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> TransportResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("push_url", &self.push_url)
            .field("pull_url", &self.pull_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Transport for HttpTransport {
    fn push(&self, request: PushRequest) -> TransportFuture<'_, PushResponse> {
        Box::pin(async move { self.post_json(&self.push_url, &request).await })
    }

    fn pull(&self, request: PullRequest) -> TransportFuture<'_, PullResponse> {
        Box::pin(async move { self.post_json(&self.pull_url, &request).await })
    }
}

/// Validate a base URL and strip trailing slashes.
pub fn normalize_base_url(base_url: &str) -> TransportResult<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(TransportError::InvalidConfiguration(
            "base URL must not be empty".to_string(),
        ));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(TransportError::InvalidConfiguration(format!(
            "base URL '{trimmed}' must start with http:// or https://"
        )));
    }
    Ok(trimmed.to_string())
}

const MAX_ERROR_BODY: usize = 200;

pub(crate) fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
