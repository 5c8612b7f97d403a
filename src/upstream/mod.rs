//! Upstream transport subsystem.
//!
//! # Data Flow
//! ```text
//! OutboundRequestSpec
//!     → client.rs (URL scheme dispatch)
//!         http / https → shared reqwest client, redirects + timeout bounded
//!         http2        → stream.rs (dedicated cleartext HTTP/2 connection)
//!         other        → UnsupportedProtocol
//!     → OriginResponse (status, headers, body)
//! ```
//!
//! # Design Decisions
//! - Automatic decompression is disabled on the primary client; the decode
//!   layer owns encoding resolution and needs the wire bytes.
//! - The streaming transport opens one connection per call and guarantees
//!   close on every exit path through a drop guard.

pub mod client;
pub mod stream;

pub use client::UpstreamClient;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

/// Uniform origin response produced by either transport.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}
