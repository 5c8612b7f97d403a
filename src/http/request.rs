//! Inbound request identification and target extraction.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4) for the middleware layers
//! - Extract and parse the client-supplied target URL
//!
//! # Design Decisions
//! - The request ID is assigned as early as possible so every log line of a
//!   request correlates.
//! - Target parsing accepts any absolute URL; scheme support is judged
//!   later by the transport dispatch, which has the redirect fallback.

use http::{HeaderMap, HeaderValue, Request};
use serde::Deserialize;
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Query parameters accepted by the proxy endpoint.
#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    /// Target URL to fetch on the client's behalf.
    pub url: Option<String>,
}

/// UUID v4 request IDs for the tower-http ID layers.
#[derive(Clone, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request ID assigned by the middleware, for log correlation.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Parse the client-supplied target. Must be an absolute URL; the url crate
/// normalizes slash shorthands like `https:/host` for the web schemes.
pub fn parse_target(raw: &str) -> Result<Url, url::ParseError> {
    Url::parse(raw.trim())
}
