//! Request orchestration and failure recovery.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → OutboundRequestSpec (fixed header synthesis)
//!     → upstream fetch (URL scheme selects the transport)
//!     → challenge check (403/503 bypass with the untouched body)
//!     → decompression (declared encoding resolved to identity bytes)
//!     → header copy + identity override + delivery policy
//!     → {transform | pass-through}
//! ```
//!
//! # Design Decisions
//! - Every error escaping the pipeline collapses into a 302 redirect toward
//!   the origin; the client never sees a bare error from this layer.
//! - The challenge bypass runs before any header copy or decode so the
//!   block page travels exactly as the origin sent it.

use std::time::Instant;

use axum::response::Response;
use http::{header, HeaderValue};

use crate::encoding::{self, ContentEncoding};
use crate::error::ProxyError;
use crate::http::response::{self, ResponseSink};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::challenge;
use crate::proxy::context::{OutboundRequestSpec, RequestContext};
use crate::proxy::policy;
use crate::upstream::OriginResponse;

/// Handle one proxied request end to end.
pub async fn run(state: &AppState, mut ctx: RequestContext, started: Instant) -> Response {
    match orchestrate(state, &mut ctx, started).await {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(
                request_id = %ctx.request_id,
                url = %ctx.url,
                error = %error,
                timeout = error.is_timeout(),
                "Request handling failed, redirecting to origin"
            );
            let response = response::redirect_to_origin(&ctx);
            metrics::record_request("redirect", response.status().as_u16(), started);
            response
        }
    }
}

async fn orchestrate(
    state: &AppState,
    ctx: &mut RequestContext,
    started: Instant,
) -> Result<Response, ProxyError> {
    let spec = OutboundRequestSpec::derive(ctx, &state.config.upstream);

    tracing::debug!(
        request_id = %ctx.request_id,
        url = %ctx.url,
        scheme = %ctx.url.scheme(),
        "Dispatching upstream fetch"
    );
    let OriginResponse {
        status,
        headers,
        body,
    } = state.upstream.fetch(&spec).await?;
    tracing::debug!(
        request_id = %ctx.request_id,
        status = %status,
        bytes = body.len(),
        "Origin responded"
    );

    if challenge::is_challenge(status) {
        tracing::info!(
            request_id = %ctx.request_id,
            status = %status,
            "Challenge status from origin, bypassing untouched"
        );
        let response = response::pass_through(ResponseSink::with_status(status), body);
        metrics::record_request("challenge", status.as_u16(), started);
        return Ok(response);
    }

    let decoded = match ContentEncoding::from_headers(&headers) {
        Some(declared) => encoding::decompress(body, declared).await,
        None => body,
    };

    let mut sink = ResponseSink::with_status(status);
    response::copy_headers(&headers, &mut sink);
    sink.set_header(header::CONTENT_ENCODING, HeaderValue::from_static("identity"));
    ctx.origin_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    ctx.origin_size = Some(decoded.len());

    let (response, outcome) = policy::deliver(
        state.policy.as_ref(),
        ctx,
        sink,
        decoded,
        &state.config.compression,
    )
    .await?;
    metrics::record_request(outcome, response.status().as_u16(), started);
    Ok(response)
}
