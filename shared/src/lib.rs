//! Shared library for the Ask proxy Lambda.
//!
//! This crate provides the request handler, CORS policy, configuration and the
//! upstream text-generation client used by the Lambda binary.

pub mod config;
pub mod cors;
pub mod error;
pub mod gemini;
pub mod http;
pub mod models;
pub mod proxy;
pub mod upstream;

pub use config::Config;
pub use cors::{CorsDecision, CorsPolicy};
pub use error::{ProxyError, Result};
pub use gemini::{GeminiClient, GeminiConfig};
pub use models::{AskRequest, ErrorBody, ReplyBody};
pub use proxy::{handle, ProxyState, EMPTY_REPLY_PLACEHOLDER};
pub use upstream::{ResponseFormat, TextGenerator, UpstreamFailure, UpstreamRequest};
