//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::upstream::{ResponseFormat, TextGenerator, UpstreamFailure, UpstreamRequest};

/// Header carrying the API key. Keeps the key out of URLs and therefore out of
/// transport error messages.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini client configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

/// Text generator backed by the Gemini REST API.
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Use a preconfigured HTTP client (proxy settings, timeouts).
    pub fn with_client(config: GeminiConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base, self.config.model
        )
    }

    /// Replace any occurrence of the API key before a message leaves this client.
    fn redact(&self, message: String) -> String {
        if self.config.api_key.is_empty() {
            message
        } else {
            message.replace(&self.config.api_key, "[REDACTED]")
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &UpstreamRequest) -> Result<String, UpstreamFailure> {
        let body = GenerateContentRequest::from(request);

        tracing::debug!(
            model = %self.config.model,
            prompt_len = request.prompt_text.len(),
            json_mode = request.response_format == ResponseFormat::Json,
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                UpstreamFailure::new(
                    e.status().map(|s| s.as_u16()),
                    self.redact(error_chain(&e.without_url())),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Gemini API returned an error");
            return Err(UpstreamFailure::new(
                Some(status.as_u16()),
                self.redact(error_message(&error_text, status.as_u16())),
            ));
        }

        let api_response: GenerateContentResponse = response.json().await.map_err(|e| {
            UpstreamFailure::new(
                Some(status.as_u16()),
                self.redact(format!(
                    "Failed to parse response: {}",
                    error_chain(&e.without_url())
                )),
            )
        })?;

        if let Some(error) = api_response.error {
            return Err(UpstreamFailure::new(
                error.code,
                self.redact(error.message.unwrap_or_else(|| "Unknown Gemini error".to_string())),
            ));
        }

        Ok(api_response.reply_text())
    }
}

/// Render an error with its source chain, e.g. `error sending request: tcp connect error: ...`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Pull a readable message out of a Gemini error body, falling back to the raw text.
fn error_message(body: &str, status: u16) -> String {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message);

    match parsed {
        Some(message) => message,
        None if body.trim().is_empty() => format!("Gemini API returned status {}", status),
        None => body.to_string(),
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl From<&UpstreamRequest> for GenerateContentRequest {
    fn from(request: &UpstreamRequest) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(&request.prompt_text)],
            }],
            system_instruction: request.system_instruction.as_ref().map(|text| Content {
                role: None,
                parts: vec![Part::text(text)],
            }),
            generation_config: match request.response_format {
                ResponseFormat::Json => Some(GenerationConfig {
                    response_mime_type: "application/json".to_string(),
                }),
                ResponseFormat::Text => None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

/// A content part. Non-text parts (inline data, function calls) decode with no text.
#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

impl GenerateContentResponse {
    /// Space-join the text parts of the first candidate.
    fn reply_text(&self) -> String {
        self.candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|p| p.text.as_deref().unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join(" ")
                    .trim()
                    .to_string()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}
