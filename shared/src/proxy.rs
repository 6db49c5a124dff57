//! Request proxy handler.
//!
//! Each invocation runs a linear pipeline: resolve CORS, short-circuit preflight,
//! gate on method and configuration, validate the body, call the upstream generator
//! once and reshape its reply. Every step either advances or ends the request with a
//! [`ProxyError`], and every response carries the same CORS headers.

use std::sync::Arc;

use lambda_http::http::header::ORIGIN;
use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::cors::{CorsDecision, CorsPolicy};
use crate::error::{ProxyError, Result};
use crate::gemini::{GeminiClient, GeminiConfig};
use crate::http::{error_response, json_response, preflight_response};
use crate::models::{AskRequest, ReplyBody};
use crate::upstream::TextGenerator;

/// Reply used when the model produced no text.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "(No response text from model)";

/// State built once at cold start and shared by every invocation.
pub struct ProxyState {
    cors: CorsPolicy,
    /// `None` when the credential is missing from configuration.
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ProxyState {
    /// Build state from configuration, wiring the Gemini client when a key is present.
    pub fn from_config(config: &Config) -> Self {
        let generator = match &config.api_key {
            Some(api_key) => {
                let client = GeminiClient::new(GeminiConfig {
                    api_key: api_key.clone(),
                    model: config.model.clone(),
                    api_base: config.api_base.clone(),
                });
                Some(Arc::new(client) as Arc<dyn TextGenerator>)
            }
            None => {
                warn!("GEMINI_API_KEY is not set; every POST will fail with a configuration error");
                None
            }
        };

        Self {
            cors: CorsPolicy::new(config.extra_origins.clone()),
            generator,
        }
    }

    /// Build state around an arbitrary generator.
    pub fn new(cors: CorsPolicy, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { cors, generator }
    }
}

/// Handle one HTTP invocation. Never fails: all errors become JSON error responses.
pub async fn handle(state: &ProxyState, event: Request) -> Response<Body> {
    let origin = event
        .headers()
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok());
    let cors = state.cors.decide(origin);

    info!(
        method = %event.method(),
        origin = origin.unwrap_or(""),
        cors_allowed = cors.allowed_origin.is_some(),
        "Ask request"
    );

    if event.method() == Method::OPTIONS {
        return preflight_response(&cors);
    }

    match process(state, &event, &cors).await {
        Ok(response) => response,
        Err(err) => {
            if err.is_client_error() {
                warn!(status = err.status_code(), "Rejected request: {}", err);
            } else {
                error!(
                    status = err.status_code(),
                    upstream_status = ?err.upstream_status(),
                    details = %err.details().unwrap_or_default(),
                    "Request failed: {}",
                    err
                );
            }
            error_response(&err, &cors)
        }
    }
}

async fn process(state: &ProxyState, event: &Request, cors: &CorsDecision) -> Result<Response<Body>> {
    if event.method() != Method::POST {
        return Err(ProxyError::UnsupportedMethod);
    }

    let generator = state
        .generator
        .as_ref()
        .ok_or(ProxyError::MissingConfiguration)?;

    let request = AskRequest::from_body(event.body().as_ref())?;
    let upstream_request = request.to_upstream();

    let reply = generator.generate(&upstream_request).await?;
    let reply = if reply.trim().is_empty() {
        info!("Upstream returned no text, using placeholder reply");
        EMPTY_REPLY_PLACEHOLDER.to_string()
    } else {
        reply.trim().to_string()
    };

    json_response(200, &ReplyBody { reply }, cors)
}
