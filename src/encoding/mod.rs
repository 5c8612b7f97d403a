//! Content-encoding subsystem.
//!
//! # Data Flow
//! ```text
//! OriginResponse body + content-encoding header
//!     → ContentEncoding::from_headers (label → closed enum)
//!     → decode.rs (multiplexer, never fails: original bytes on error)
//!     → decoded payload
//!
//! Decoded payload on the transform path:
//!     → encode.rs (gzip or brotli, picked from the client's accept-encoding)
//!     → recompressed payload
//! ```
//!
//! # Design Decisions
//! - Dispatch is a closed enum matched exhaustively, with an Unknown case
//!   carrying the raw label for diagnostics.
//! - A decode failure substitutes the original bytes instead of propagating;
//!   downstream stages tolerate mislabeled payloads.
//! - Codec work runs on the blocking pool so large payloads cannot stall the
//!   async scheduler.

pub mod decode;
pub mod encode;

pub use decode::decompress;
pub use encode::{compress, AcceptedEncodings, CompressionCodec};

use std::fmt;

use http::{header, HeaderMap};

/// Declared content encoding of an origin payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    Brotli,
    Deflate,
    Lzma,
    Lzma2,
    Zstd,
    /// Label outside the supported set, kept verbatim for diagnostics.
    Unknown(String),
}

impl ContentEncoding {
    /// Map a header label onto the supported set. `br` is the wire name for
    /// brotli.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "gzip" => ContentEncoding::Gzip,
            "br" => ContentEncoding::Brotli,
            "deflate" => ContentEncoding::Deflate,
            "lzma" => ContentEncoding::Lzma,
            "lzma2" => ContentEncoding::Lzma2,
            "zstd" => ContentEncoding::Zstd,
            other => ContentEncoding::Unknown(other.to_string()),
        }
    }

    /// Read the declared encoding from a response header map. Absence means
    /// the body is already identity-encoded and decoding is skipped.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(header::CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .map(Self::parse)
    }

    /// Wire label for logs and metrics.
    pub fn label(&self) -> &str {
        match self {
            ContentEncoding::Gzip => "gzip",
            ContentEncoding::Brotli => "br",
            ContentEncoding::Deflate => "deflate",
            ContentEncoding::Lzma => "lzma",
            ContentEncoding::Lzma2 => "lzma2",
            ContentEncoding::Zstd => "zstd",
            ContentEncoding::Unknown(label) => label,
        }
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
