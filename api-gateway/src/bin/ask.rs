//! Ask Lambda - Handles the /api/ask endpoint.
//!
//! Validates browser requests, applies the CORS allow-list and forwards the prompt to
//! Gemini, returning `{ "reply": ... }` or a JSON error envelope.

use lambda_http::{run, service_fn, Error, Request};
use shared::{Config, ProxyState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env();
    info!(
        model = %config.model,
        extra_origins = config.extra_origins.len(),
        "Starting ask proxy"
    );

    let state = Arc::new(ProxyState::from_config(&config));

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { Ok::<_, Error>(shared::handle(&state, event).await) }
    }))
    .await
}
