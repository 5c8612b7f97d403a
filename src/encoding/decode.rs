//! Decompression multiplexer.
//!
//! # Responsibilities
//! - Resolve a declared content-encoding into identity bytes
//! - Recover every decode failure by substituting the pre-decode bytes
//! - Keep codec work off the async scheduler
//!
//! # Design Decisions
//! - The never-fail contract is deliberate: origins mislabel encodings often
//!   enough that serving the original bytes beats serving an error page.
//! - `lzma` and `lzma2` share one auto-detecting decoder; the container
//!   self-describes its variant in-stream.
//! - zstd uses the one-shot call, no dictionary support.

use std::io::Read;

use bytes::Bytes;

use crate::encoding::ContentEncoding;
use crate::observability::metrics;

/// Buffer size for the streaming brotli reader.
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Resolve `body` to identity bytes according to its declared encoding.
///
/// Never fails: an unrecognized label or a malformed payload yields the
/// input unchanged, with a diagnostic logged.
pub async fn decompress(body: Bytes, encoding: ContentEncoding) -> Bytes {
    if let ContentEncoding::Unknown(label) = &encoding {
        tracing::warn!(encoding = %label, "Unknown content-encoding, passing body through");
        return body;
    }

    let input = body.clone();
    let codec = encoding.clone();
    match tokio::task::spawn_blocking(move || decode(&input, &codec)).await {
        Ok(Ok(decoded)) => Bytes::from(decoded),
        Ok(Err(error)) => {
            tracing::error!(
                encoding = %encoding,
                error = %error,
                "Decompression failed, serving original bytes"
            );
            metrics::record_decode_failure(encoding.label().to_string());
            body
        }
        Err(error) => {
            tracing::error!(
                encoding = %encoding,
                error = %error,
                "Decoder task failed, serving original bytes"
            );
            metrics::record_decode_failure(encoding.label().to_string());
            body
        }
    }
}

fn decode(data: &[u8], encoding: &ContentEncoding) -> std::io::Result<Vec<u8>> {
    match encoding {
        ContentEncoding::Gzip => {
            let mut decoded = Vec::new();
            flate2::read::GzDecoder::new(data).read_to_end(&mut decoded)?;
            Ok(decoded)
        }
        ContentEncoding::Brotli => {
            let mut decoded = Vec::new();
            brotli::Decompressor::new(data, BROTLI_BUFFER_SIZE).read_to_end(&mut decoded)?;
            Ok(decoded)
        }
        ContentEncoding::Deflate => {
            let mut decoded = Vec::new();
            flate2::read::DeflateDecoder::new(data).read_to_end(&mut decoded)?;
            Ok(decoded)
        }
        ContentEncoding::Lzma | ContentEncoding::Lzma2 => decode_lzma(data),
        ContentEncoding::Zstd => zstd::stream::decode_all(data),
        ContentEncoding::Unknown(_) => Ok(data.to_vec()),
    }
}

/// liblzma's auto decoder accepts both the xz container and the legacy
/// alone format, so both labels resolve here.
fn decode_lzma(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let stream = xz2::stream::Stream::new_auto_decoder(u64::MAX, 0)
        .map_err(std::io::Error::other)?;
    let mut decoded = Vec::new();
    xz2::read::XzDecoder::new_stream(data, stream).read_to_end(&mut decoded)?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PAGE: &[u8] = b"<!doctype html><html><head><title>weather</title></head>\
        <body><p>Scattered showers through the afternoon, clearing overnight. \
        Winds light and variable.</p></body></html>";

    fn gzip_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[tokio::test]
    async fn gzip_round_trip() {
        let decoded = decompress(Bytes::from(gzip_bytes(PAGE)), ContentEncoding::Gzip).await;
        assert_eq!(&decoded[..], PAGE);
    }

    #[tokio::test]
    async fn brotli_round_trip() {
        let mut encoder = brotli::CompressorWriter::new(Vec::new(), 4096, 5, 22);
        encoder.write_all(PAGE).unwrap();
        let compressed = encoder.into_inner();

        let decoded = decompress(Bytes::from(compressed), ContentEncoding::Brotli).await;
        assert_eq!(&decoded[..], PAGE);
    }

    #[tokio::test]
    async fn deflate_round_trip() {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(PAGE).unwrap();
        let compressed = encoder.finish().unwrap();

        let decoded = decompress(Bytes::from(compressed), ContentEncoding::Deflate).await;
        assert_eq!(&decoded[..], PAGE);
    }

    #[tokio::test]
    async fn zstd_round_trip() {
        let compressed = zstd::stream::encode_all(PAGE, 3).unwrap();
        let decoded = decompress(Bytes::from(compressed), ContentEncoding::Zstd).await;
        assert_eq!(&decoded[..], PAGE);
    }

    #[tokio::test]
    async fn lzma_alone_format_round_trip() {
        let options = xz2::stream::LzmaOptions::new_preset(6).unwrap();
        let stream = xz2::stream::Stream::new_lzma_encoder(&options).unwrap();
        let mut compressed = Vec::new();
        xz2::read::XzEncoder::new_stream(PAGE, stream)
            .read_to_end(&mut compressed)
            .unwrap();

        let decoded = decompress(Bytes::from(compressed), ContentEncoding::Lzma).await;
        assert_eq!(&decoded[..], PAGE);
    }

    #[tokio::test]
    async fn lzma2_xz_container_round_trip() {
        let mut compressed = Vec::new();
        xz2::read::XzEncoder::new(PAGE, 6)
            .read_to_end(&mut compressed)
            .unwrap();

        let decoded = decompress(Bytes::from(compressed), ContentEncoding::Lzma2).await;
        assert_eq!(&decoded[..], PAGE);
    }

    #[tokio::test]
    async fn unknown_label_passes_body_through() {
        let body = Bytes::from_static(b"\x00\x01\x02 see you");
        let decoded = decompress(
            body.clone(),
            ContentEncoding::Unknown("compress".to_string()),
        )
        .await;
        assert_eq!(decoded, body);
    }

    #[tokio::test]
    async fn corrupted_payload_yields_original_bytes() {
        let mut corrupted = gzip_bytes(PAGE);
        let mid = corrupted.len() / 2;
        corrupted.truncate(mid);
        let body = Bytes::from(corrupted);

        let decoded = decompress(body.clone(), ContentEncoding::Gzip).await;
        assert_eq!(decoded, body);
    }

    #[tokio::test]
    async fn mislabeled_payload_yields_original_bytes() {
        // Plain text declared as zstd must come back untouched.
        let body = Bytes::from_static(PAGE);
        let decoded = decompress(body.clone(), ContentEncoding::Zstd).await;
        assert_eq!(decoded, body);
    }
}
