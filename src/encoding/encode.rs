//! Outbound payload recompression.
//!
//! # Responsibilities
//! - Parse the codecs a client is willing to receive
//! - Re-encode a decoded payload with the strongest accepted codec
//!
//! # Design Decisions
//! - Brotli is preferred over gzip when both are accepted.
//! - Encoder failures propagate; the orchestration layer owns the fallback.

use std::io::Write;

use bytes::Bytes;

use crate::config::schema::CompressionConfig;
use crate::error::TransformError;

/// Buffer size for the streaming brotli writer.
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Brotli window size exponent, the codec maximum.
const BROTLI_LG_WINDOW: u32 = 22;

/// Codec used when re-encoding a payload toward the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionCodec {
    Gzip,
    Brotli,
}

impl CompressionCodec {
    /// Wire label for the content-encoding header.
    pub fn label(&self) -> &'static str {
        match self {
            CompressionCodec::Gzip => "gzip",
            CompressionCodec::Brotli => "br",
        }
    }
}

/// Outbound codecs the client advertised in its accept-encoding header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptedEncodings {
    pub gzip: bool,
    pub brotli: bool,
}

impl AcceptedEncodings {
    /// Parse an accept-encoding header value. Quality values are ignored
    /// beyond token recognition; `*` admits every supported codec.
    pub fn parse(header: Option<&str>) -> Self {
        let mut accepts = Self::default();
        let Some(raw) = header else {
            return accepts;
        };
        for entry in raw.split(',') {
            let token = entry.split(';').next().unwrap_or("").trim();
            match token {
                "gzip" => accepts.gzip = true,
                "br" => accepts.brotli = true,
                "*" => {
                    accepts.gzip = true;
                    accepts.brotli = true;
                }
                _ => {}
            }
        }
        accepts
    }

    /// True when at least one supported codec is accepted.
    pub fn any(&self) -> bool {
        self.gzip || self.brotli
    }

    /// Strongest accepted codec.
    pub fn preferred(&self) -> Option<CompressionCodec> {
        if self.brotli {
            Some(CompressionCodec::Brotli)
        } else if self.gzip {
            Some(CompressionCodec::Gzip)
        } else {
            None
        }
    }
}

/// Compress `body` with `codec`, off the async scheduler.
pub async fn compress(
    body: Bytes,
    codec: CompressionCodec,
    config: &CompressionConfig,
) -> Result<Bytes, TransformError> {
    let gzip_level = config.gzip_level;
    let brotli_quality = config.brotli_quality;
    let encoded =
        tokio::task::spawn_blocking(move || encode(&body, codec, gzip_level, brotli_quality))
            .await??;
    Ok(Bytes::from(encoded))
}

fn encode(
    data: &[u8],
    codec: CompressionCodec,
    gzip_level: u32,
    brotli_quality: u32,
) -> Result<Vec<u8>, TransformError> {
    match codec {
        CompressionCodec::Gzip => {
            let mut encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::new(gzip_level));
            encoder
                .write_all(data)
                .map_err(|source| TransformError::Encode { codec: "gzip", source })?;
            encoder
                .finish()
                .map_err(|source| TransformError::Encode { codec: "gzip", source })
        }
        CompressionCodec::Brotli => {
            let mut encoder = brotli::CompressorWriter::new(
                Vec::new(),
                BROTLI_BUFFER_SIZE,
                brotli_quality,
                BROTLI_LG_WINDOW,
            );
            encoder
                .write_all(data)
                .map_err(|source| TransformError::Encode { codec: "br", source })?;
            Ok(encoder.into_inner())
        }
    }
}
