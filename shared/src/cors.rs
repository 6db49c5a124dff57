//! CORS policy for browser callers.
//!
//! Allowed origins echo back in `Access-Control-Allow-Origin`. Anything else gets no
//! allow-origin header at all; a wildcard is never sent because credentials are allowed.

use lambda_http::http::header::{HeaderMap, HeaderValue, VARY};

pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
pub const ALLOW_METHODS: &str = "access-control-allow-methods";
pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
pub const MAX_AGE: &str = "access-control-max-age";

/// Methods advertised on every response.
pub const ALLOWED_METHODS: &[&str] = &["POST", "OPTIONS"];

/// Request headers advertised on every response.
pub const ALLOWED_HEADERS: &[&str] = &["Content-Type", "X-Requested-With", "Accept"];

/// Hosting domains whose subdomains are trusted.
const TRUSTED_HOST_SUFFIXES: &[&str] = &[".github.io", ".vercel.app"];

/// Local development hosts, trusted over plain http on any port.
const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

const PREFLIGHT_MAX_AGE_SECS: u32 = 86400;

/// Static origin allow-list.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    extra_origins: Vec<String>,
}

/// CORS outcome for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsDecision {
    pub allowed_origin: Option<String>,
    pub allowed_methods: &'static [&'static str],
    pub allowed_headers: &'static [&'static str],
}

impl CorsPolicy {
    /// Create a policy with additional exact-match origins.
    pub fn new(extra_origins: Vec<String>) -> Self {
        Self { extra_origins }
    }

    /// Check whether an origin is on the allow-list.
    pub fn is_allowed(&self, origin: &str) -> bool {
        let origin = normalize_origin(origin);
        if origin.is_empty() {
            return false;
        }

        if self
            .extra_origins
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(origin))
        {
            return true;
        }

        let Some((scheme, host)) = split_origin(origin) else {
            return false;
        };

        let trusted_host = TRUSTED_HOST_SUFFIXES
            .iter()
            .any(|suffix| host.len() > suffix.len() && host.ends_with(suffix));
        let local_host = scheme == "http" && LOCAL_HOSTS.contains(&host.as_str());

        trusted_host || local_host
    }

    /// Resolve the CORS headers for a request carrying the given `origin` header.
    pub fn decide(&self, origin: Option<&str>) -> CorsDecision {
        let allowed_origin = origin
            .map(normalize_origin)
            .filter(|o| self.is_allowed(o))
            .map(String::from);

        CorsDecision {
            allowed_origin,
            allowed_methods: ALLOWED_METHODS,
            allowed_headers: ALLOWED_HEADERS,
        }
    }
}

impl CorsDecision {
    /// Write the decision onto a response's headers.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(origin) = &self.allowed_origin {
            // Origin came from a request header, so it is already a valid header value.
            if let Ok(value) = HeaderValue::from_str(origin) {
                headers.insert(ALLOW_ORIGIN, value);
            }
        }

        // The allow-origin header depends on the request, allowed or not.
        headers.append(VARY, HeaderValue::from_static("Origin"));

        headers.insert(ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        if let Ok(value) = HeaderValue::from_str(&self.allowed_methods.join(", ")) {
            headers.insert(ALLOW_METHODS, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.allowed_headers.join(", ")) {
            headers.insert(ALLOW_HEADERS, value);
        }
        headers.insert(MAX_AGE, HeaderValue::from(PREFLIGHT_MAX_AGE_SECS));
    }
}

/// Strip surrounding whitespace and a trailing slash, the form browsers send.
fn normalize_origin(origin: &str) -> &str {
    origin.trim().trim_end_matches('/')
}

/// Split `scheme://host[:port]` into a lowercase scheme and host.
fn split_origin(origin: &str) -> Option<(String, String)> {
    let (scheme, rest) = origin.split_once("://")?;
    let scheme = scheme.to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return None;
    }

    let authority = rest.split('/').next().unwrap_or_default();
    if authority.contains('@') {
        return None;
    }

    let host = match authority.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        Some(_) => return None,
        None => authority,
    };

    if host.is_empty() {
        return None;
    }

    Some((scheme, host.to_ascii_lowercase()))
}
