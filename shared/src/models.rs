//! Client-facing request and response payloads.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ProxyError, Result, MISSING_PROMPT};
use crate::upstream::{ResponseFormat, UpstreamRequest};

/// Validated `POST` body.
///
/// Only `prompt` is required. Optional fields that are present with the wrong type
/// are ignored rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub context: Option<String>,
    pub mode: ResponseFormat,
}

impl AskRequest {
    /// Parse and validate a raw request body.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|_| ProxyError::InvalidRequest(MISSING_PROMPT.to_string()))?;

        let prompt = value
            .get("prompt")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ProxyError::InvalidRequest(MISSING_PROMPT.to_string()))?;

        let optional_text = |field: &str| {
            value
                .get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        let mode = match value.get("mode").and_then(Value::as_str) {
            Some("json") => ResponseFormat::Json,
            _ => ResponseFormat::Text,
        };

        Ok(Self {
            prompt: prompt.to_string(),
            system_instruction: optional_text("systemInstruction"),
            context: optional_text("context"),
            mode,
        })
    }

    /// Build the normalized upstream payload.
    pub fn to_upstream(&self) -> UpstreamRequest {
        let prompt_text = match &self.context {
            Some(context) => format!("{}\n\n{}", context, self.prompt),
            None => self.prompt.clone(),
        };

        UpstreamRequest {
            prompt_text,
            system_instruction: self.system_instruction.clone(),
            response_format: self.mode,
        }
    }
}

/// Successful reply body.
#[derive(Debug, Serialize)]
pub struct ReplyBody {
    pub reply: String,
}

/// Error body shared by every failure response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&ProxyError> for ErrorBody {
    fn from(err: &ProxyError) -> Self {
        Self {
            error: err.to_string(),
            details: err.details(),
        }
    }
}
