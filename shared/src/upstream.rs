//! Abstraction over the text-generation service the proxy forwards to.
//!
//! The handler only talks to [`TextGenerator`], so the concrete vendor client can be
//! swapped (or stubbed in tests) without touching request handling.

use async_trait::async_trait;
use thiserror::Error;

/// Output format requested from the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Strict JSON text
    Json,
}

/// Normalized payload sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub prompt_text: String,
    pub system_instruction: Option<String>,
    pub response_format: ResponseFormat,
}

/// Failure reported by (or while reaching) the upstream service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("upstream failure (status {status:?}): {message}")]
pub struct UpstreamFailure {
    /// HTTP status returned upstream, `None` for transport or decode failures
    pub status: Option<u16>,
    /// Human-readable message, safe to show to clients
    pub message: String,
}

impl UpstreamFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// A service that turns a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Issue exactly one generation call and return the reply text (possibly empty).
    async fn generate(&self, request: &UpstreamRequest) -> Result<String, UpstreamFailure>;
}
