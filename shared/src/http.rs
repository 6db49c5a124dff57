//! HTTP helpers for the Lambda handler.

use lambda_http::http::header::{HeaderValue, CONTENT_TYPE};
use lambda_http::http::StatusCode;
use lambda_http::{Body, Response};
use serde::Serialize;

use crate::cors::CorsDecision;
use crate::error::ProxyError;
use crate::models::ErrorBody;

/// Create a JSON response with the given status code, data and CORS headers.
pub fn json_response<T: Serialize>(
    status: u16,
    data: &T,
    cors: &CorsDecision,
) -> Result<Response<Body>, ProxyError> {
    let body = serde_json::to_string(data)?;
    let mut response = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .map_err(|e| ProxyError::Internal(e.to_string()))?;

    cors.apply(response.headers_mut());
    Ok(response)
}

/// Create the uniform error response for a proxy error.
///
/// Never fails: if the JSON envelope cannot be built a fixed fallback body is used.
pub fn error_response(err: &ProxyError, cors: &CorsDecision) -> Response<Body> {
    json_response(err.status_code(), &ErrorBody::from(err), cors).unwrap_or_else(|_| {
        let mut response = Response::new(Body::from(r#"{"error":"Failed to process request"}"#));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        cors.apply(response.headers_mut());
        response
    })
}

/// Bodiless response for CORS preflight requests.
pub fn preflight_response(cors: &CorsDecision) -> Response<Body> {
    let mut response = Response::new(Body::Empty);
    *response.status_mut() = StatusCode::NO_CONTENT;
    cors.apply(response.headers_mut());
    response
}
