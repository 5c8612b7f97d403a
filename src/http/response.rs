//! Response assembly and terminal writers.
//!
//! # Responsibilities
//! - Accumulate outbound status and headers in a ResponseSink
//! - Copy origin headers, dropping hop-by-hop headers and the stale length
//! - Terminal writers: transform, pass-through, redirect, JSON errors
//!
//! # Design Decisions
//! - Exactly one terminal writer finishes each response; the sink is
//!   consumed by value so a response cannot be finished twice.
//! - The transform writer ships the identity bytes when the encoder cannot
//!   beat them, so a response is never inflated.

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::config::schema::CompressionConfig;
use crate::encoding::{encode, CompressionCodec};
use crate::error::TransformError;
use crate::observability::metrics;
use crate::proxy::context::RequestContext;

/// Headers that must not be forwarded from the origin response.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Marker set on responses delivered without transformation.
const X_PROXY_BYPASS: &str = "x-proxy-bypass";

/// Decoded payload size before recompression.
const X_ORIGINAL_SIZE: &str = "x-original-size";

/// Bytes trimmed from the payload by recompression.
const X_BYTES_SAVED: &str = "x-bytes-saved";

/// Accumulates the outbound status and headers until a terminal writer
/// attaches the body.
#[derive(Debug)]
pub struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseSink {
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    /// Set a header, replacing any copied value of the same name.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn finish(self, body: Bytes) -> Response {
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Copy origin headers onto the sink. Hop-by-hop headers stay behind, and
/// the origin's content-length is dropped because the body length changes
/// after decoding.
pub fn copy_headers(origin: &HeaderMap, sink: &mut ResponseSink) {
    for (name, value) in origin {
        if *name == header::CONTENT_LENGTH || HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            continue;
        }
        sink.headers_mut().append(name.clone(), value.clone());
    }
}

/// Recompress the payload and finish the response.
pub async fn transform(
    ctx: &RequestContext,
    mut sink: ResponseSink,
    body: Bytes,
    compression: &CompressionConfig,
) -> Result<Response, TransformError> {
    let codec = ctx.accepts.preferred().unwrap_or(CompressionCodec::Gzip);
    let original_len = body.len();
    let encoded = encode::compress(body.clone(), codec, compression).await?;

    if encoded.len() >= original_len {
        tracing::debug!(
            request_id = %ctx.request_id,
            codec = codec.label(),
            original = original_len,
            encoded = encoded.len(),
            "Encoded output not smaller, shipping identity bytes"
        );
        sink.set_header(header::CONTENT_LENGTH, HeaderValue::from(original_len as u64));
        sink.set_header(
            HeaderName::from_static(X_ORIGINAL_SIZE),
            HeaderValue::from(original_len as u64),
        );
        sink.set_header(HeaderName::from_static(X_BYTES_SAVED), HeaderValue::from(0u64));
        return Ok(sink.finish(body));
    }

    let saved = (original_len - encoded.len()) as u64;
    metrics::record_bytes_saved(saved);
    tracing::debug!(
        request_id = %ctx.request_id,
        codec = codec.label(),
        original = original_len,
        encoded = encoded.len(),
        "Payload recompressed"
    );

    sink.set_header(
        header::CONTENT_ENCODING,
        HeaderValue::from_static(codec.label()),
    );
    sink.set_header(header::VARY, HeaderValue::from_static("accept-encoding"));
    sink.set_header(header::CONTENT_LENGTH, HeaderValue::from(encoded.len() as u64));
    sink.set_header(
        HeaderName::from_static(X_ORIGINAL_SIZE),
        HeaderValue::from(original_len as u64),
    );
    sink.set_header(HeaderName::from_static(X_BYTES_SAVED), HeaderValue::from(saved));
    Ok(sink.finish(encoded))
}

/// Deliver the payload unchanged, marking the bypass for the client.
pub fn pass_through(mut sink: ResponseSink, body: Bytes) -> Response {
    sink.set_header(
        HeaderName::from_static(X_PROXY_BYPASS),
        HeaderValue::from_static("1"),
    );
    sink.set_header(header::CONTENT_LENGTH, HeaderValue::from(body.len() as u64));
    sink.finish(body)
}

/// Send the client to fetch the origin directly.
pub fn redirect_to_origin(ctx: &RequestContext) -> Response {
    match HeaderValue::from_str(ctx.url.as_str()) {
        Ok(location) => {
            let mut sink = ResponseSink::with_status(StatusCode::FOUND);
            sink.set_header(header::LOCATION, location);
            sink.finish(Bytes::new())
        }
        Err(_) => error_response(
            StatusCode::BAD_GATEWAY,
            "upstream_failed",
            "origin fetch failed",
        ),
    }
}

/// JSON error body for requests rejected before orchestration.
pub fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "error": {
            "type": kind,
            "message": message,
        }
    });
    (status, axum::Json(body)).into_response()
}
