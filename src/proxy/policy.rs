//! Delivery policy for decoded payloads.
//!
//! # Responsibilities
//! - Decide once per request between the transform and pass-through paths
//! - Hand the payload to exactly one terminal writer
//!
//! # Design Decisions
//! - The candidacy predicate is a trait object so tests can force either
//!   path and deployments can swap the heuristic.
//! - Pre-compressed media is excluded by content type; recompressing a JPEG
//!   or PNG wastes cycles for negative savings.

use axum::response::Response;
use bytes::Bytes;

use crate::config::schema::CompressionConfig;
use crate::error::TransformError;
use crate::http::response::{self, ResponseSink};
use crate::proxy::context::RequestContext;

/// Decides whether a decoded payload should be recompressed.
pub trait TransformPolicy: Send + Sync {
    fn should_transform(&self, ctx: &RequestContext, body: &[u8]) -> bool;
}

/// Production policy: recompress payloads that are large enough, textual,
/// and acceptable to the client in a supported codec.
#[derive(Debug, Clone)]
pub struct CompressionCandidates {
    min_size: usize,
}

impl CompressionCandidates {
    pub fn new(min_size: usize) -> Self {
        Self { min_size }
    }

    /// Content types worth recompressing. Images ship pre-compressed and are
    /// excluded, with SVG as the textual exception.
    fn is_compressible(content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or("").trim();
        if essence == "image/svg+xml" {
            return true;
        }
        if essence.starts_with("image/") {
            return false;
        }
        essence.starts_with("text/")
            || matches!(
                essence,
                "application/json"
                    | "application/javascript"
                    | "application/xml"
                    | "application/xhtml+xml"
                    | "application/rss+xml"
                    | "application/atom+xml"
                    | "application/wasm"
            )
    }
}

impl TransformPolicy for CompressionCandidates {
    fn should_transform(&self, ctx: &RequestContext, body: &[u8]) -> bool {
        if body.len() < self.min_size {
            return false;
        }
        if !ctx.accepts.any() {
            return false;
        }
        match &ctx.origin_type {
            Some(content_type) => Self::is_compressible(content_type),
            None => false,
        }
    }
}

/// Route the decoded payload to exactly one terminal writer.
///
/// Returns the response together with the outcome label recorded by the
/// orchestration.
pub async fn deliver(
    policy: &dyn TransformPolicy,
    ctx: &RequestContext,
    sink: ResponseSink,
    body: Bytes,
    compression: &CompressionConfig,
) -> Result<(Response, &'static str), TransformError> {
    if policy.should_transform(ctx, &body) {
        let response = response::transform(ctx, sink, body, compression).await?;
        Ok((response, "transform"))
    } else {
        Ok((response::pass_through(sink, body), "bypass"))
    }
}
