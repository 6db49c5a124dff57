//! Error types for the proxy Lambda.

use thiserror::Error;

use crate::upstream::UpstreamFailure;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Message returned for any body that lacks a usable `prompt`.
pub const MISSING_PROMPT: &str = "Missing 'prompt' string in body";

/// Errors that can terminate a proxy request.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Malformed or missing required body fields
    #[error("{0}")]
    InvalidRequest(String),

    /// Wrong HTTP verb
    #[error("Method Not Allowed")]
    UnsupportedMethod,

    /// Credential absent from the runtime configuration
    #[error("Missing GEMINI_API_KEY environment variable")]
    MissingConfiguration,

    /// Upstream service returned a failure or an unusable payload
    #[error("Upstream API error")]
    Upstream(#[from] UpstreamFailure),

    /// Anything unexpected while processing the request
    #[error("Failed to process request")]
    Internal(String),
}

impl ProxyError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::InvalidRequest(_) => 400,
            ProxyError::UnsupportedMethod => 405,
            _ => 500,
        }
    }

    /// Extra detail shown to the client next to the error message.
    pub fn details(&self) -> Option<String> {
        match self {
            ProxyError::Upstream(failure) => Some(failure.message.clone()),
            ProxyError::Internal(details) => Some(details.clone()),
            _ => None,
        }
    }

    /// Status reported by the upstream service, when it got that far.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ProxyError::Upstream(failure) => failure.status,
            _ => None,
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(e: serde_json::Error) -> Self {
        ProxyError::Internal(e.to_string())
    }
}
