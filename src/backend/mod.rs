//! Transport abstraction for the stats backend.
//!
//! A backend performs exactly one JSON POST and hands back the raw status and body.
//! Interpreting those (processing markers, error payloads, decoding) is the job of
//! [`crate::fetch::Fetcher`], so test doubles only need to script responses.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

pub mod http;

pub use http::HttpBackend;

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// Timeouts and connection failures are worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Timeout(_) | BackendError::Network(_))
    }
}

/// Raw backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: String,
}

impl BackendResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON, if it is JSON at all
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Backend trait implemented by every transport the fetcher can drive.
#[async_trait]
pub trait StatsBackend: Send + Sync {
    /// Returns the backend type identifier (e.g., "http").
    fn backend_type(&self) -> &str;

    /// POST `payload` to `endpoint`, giving up after `timeout`.
    async fn post_json(&self, endpoint: &str, payload: &Value, timeout: Duration)
        -> Result<BackendResponse, BackendError>;
}
