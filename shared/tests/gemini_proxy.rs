//! End-to-end handler tests against a mocked Gemini endpoint.

use lambda_http::{Body, Request, Response};
use serde_json::{json, Value};
use shared::{
    handle, Config, GeminiClient, GeminiConfig, ProxyState, TextGenerator, UpstreamRequest,
    EMPTY_REPLY_PLACEHOLDER,
};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "AIza-test-key-0123456789";
const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn state_for(server: &MockServer, api_key: Option<&str>) -> ProxyState {
    state_for_base(server.uri(), api_key)
}

fn state_for_base(base: String, api_key: Option<&str>) -> ProxyState {
    let config = Config::from_lookup(|name| match name {
        "GEMINI_API_KEY" => api_key.map(String::from),
        "GEMINI_API_BASE" => Some(base.clone()),
        _ => None,
    });
    ProxyState::from_config(&config)
}

fn post(body: Value) -> Request {
    lambda_http::http::Request::builder()
        .method("POST")
        .uri("https://api.example.com/api/ask")
        .header("origin", "http://localhost:3000")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn response_json(response: &Response<Body>) -> Value {
    serde_json::from_slice(response.body().as_ref()).unwrap()
}

fn response_text(response: &Response<Body>) -> String {
    let headers: Vec<String> = response
        .headers()
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or_default()))
        .collect();
    format!(
        "{}\n{}",
        headers.join("\n"),
        String::from_utf8_lossy(response.body().as_ref())
    )
}

#[tokio::test]
async fn test_reply_reshaped_from_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", API_KEY))
        .and(body_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Say A then B" }] }],
            "systemInstruction": { "parts": [{ "text": "Be terse" }] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "A" }, { "text": "B" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = state_for(&server, Some(API_KEY));
    let response = handle(
        &state,
        post(json!({ "prompt": "Say A then B", "systemInstruction": "Be terse" })),
    )
    .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response_json(&response), json!({ "reply": "A B" }));
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_json_mode_sets_response_mime_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Background\n\nList colors" }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "[\"red\",\"blue\"]" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = state_for(&server, Some(API_KEY));
    let response = handle(
        &state,
        post(json!({ "prompt": "List colors", "context": "Background", "mode": "json" })),
    )
    .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response_json(&response), json!({ "reply": "[\"red\",\"blue\"]" }));
}

#[tokio::test]
async fn test_empty_candidates_use_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let state = state_for(&server, Some(API_KEY));
    let response = handle(&state, post(json!({ "prompt": "hello" }))).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response_json(&response), json!({ "reply": EMPTY_REPLY_PLACEHOLDER }));
}

#[tokio::test]
async fn test_upstream_error_surfaced_without_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": format!("API key {} not valid. Please pass a valid API key.", API_KEY),
                "status": "INVALID_ARGUMENT"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = state_for(&server, Some(API_KEY));
    let response = handle(&state, post(json!({ "prompt": "hello" }))).await;

    assert_eq!(response.status(), 500);
    let body = response_json(&response);
    assert_eq!(body["error"], "Upstream API error");
    assert_eq!(
        body["details"],
        "API key [REDACTED] not valid. Please pass a valid API key."
    );
    assert!(!response_text(&response).contains(API_KEY));
}

#[tokio::test]
async fn test_undecodable_success_payload_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let state = state_for(&server, Some(API_KEY));
    let response = handle(&state, post(json!({ "prompt": "hello" }))).await;

    assert_eq!(response.status(), 500);
    let body = response_json(&response);
    assert_eq!(body["error"], "Upstream API error");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse response"));
}

#[tokio::test]
async fn test_missing_key_never_calls_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = state_for(&server, None);
    let response = handle(&state, post(json!({ "prompt": "hello" }))).await;

    assert_eq!(response.status(), 500);
    assert_eq!(
        response_json(&response),
        json!({ "error": "Missing GEMINI_API_KEY environment variable" })
    );
}

#[tokio::test]
async fn test_error_payload_on_success_status_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "code": 429, "message": "quota" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = state_for(&server, Some(API_KEY));
    let response = handle(&state, post(json!({ "prompt": "hello" }))).await;

    assert_eq!(response.status(), 500);
    assert_eq!(
        response_json(&response),
        json!({ "error": "Upstream API error", "details": "quota" })
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_upstream_error() {
    // Nothing listens on port 1.
    let state = state_for_base("http://127.0.0.1:1".to_string(), Some(API_KEY));
    let response = handle(&state, post(json!({ "prompt": "hello" }))).await;

    assert_eq!(response.status(), 500);
    let body = response_json(&response);
    assert_eq!(body["error"], "Upstream API error");
    let details = body["details"].as_str().unwrap();
    assert!(details.starts_with("error sending request: "), "{}", details);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
    assert!(!response_text(&response).contains(API_KEY));
}

#[tokio::test]
async fn test_injected_client_timeout_reported_with_cause() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "candidates": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = GeminiClient::with_client(
        GeminiConfig {
            api_key: API_KEY.to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_base: server.uri(),
        },
        http,
    );

    let failure = client
        .generate(&UpstreamRequest {
            prompt_text: "hello".to_string(),
            system_instruction: None,
            response_format: Default::default(),
        })
        .await
        .unwrap_err();

    assert_eq!(failure.status, None);
    assert!(failure.message.contains(": "), "{}", failure.message);
    assert!(!failure.message.contains(API_KEY));
}
