//! Primary upstream fetch and transport selection.

use crate::config::schema::UpstreamConfig;
use crate::error::{TransportError, TransportResult};
use crate::proxy::context::OutboundRequestSpec;
use crate::upstream::{stream, OriginResponse};

/// Shared client for the primary transport plus the scheme dispatch.
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Build the shared HTTP client. Automatic decompression stays off so
    /// the decode layer sees the wire bytes; redirects are bounded by
    /// configuration.
    pub fn new(upstream: &UpstreamConfig) -> TransportResult<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(upstream.max_redirects))
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .no_zstd()
            .build()?;
        Ok(Self { http })
    }

    /// Fetch the target, selecting the transport from the URL scheme.
    pub async fn fetch(&self, spec: &OutboundRequestSpec) -> TransportResult<OriginResponse> {
        match spec.url.scheme() {
            "http" | "https" => self.fetch_primary(spec).await,
            "http2" => stream::fetch(spec).await,
            other => Err(TransportError::UnsupportedProtocol(other.to_string())),
        }
    }

    async fn fetch_primary(&self, spec: &OutboundRequestSpec) -> TransportResult<OriginResponse> {
        let response = self
            .http
            .get(spec.url.clone())
            .headers(spec.headers.clone())
            .timeout(spec.timeout)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(OriginResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use std::time::Duration;
    use url::Url;

    fn spec_for(url: &str) -> OutboundRequestSpec {
        OutboundRequestSpec {
            url: Url::parse(url).unwrap(),
            headers: HeaderMap::new(),
            stream_headers: HeaderMap::new(),
            timeout: Duration::from_secs(1),
            max_redirects: 5,
        }
    }

    #[tokio::test]
    async fn unsupported_scheme_is_rejected_without_a_fetch() {
        let client = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
        let result = client.fetch(&spec_for("ftp://archive.example/file.tar")).await;
        match result {
            Err(TransportError::UnsupportedProtocol(scheme)) => assert_eq!(scheme, "ftp"),
            other => panic!("expected UnsupportedProtocol, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mailto_scheme_is_rejected() {
        let client = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
        let result = client.fetch(&spec_for("mailto:ops@example.com")).await;
        assert!(matches!(
            result,
            Err(TransportError::UnsupportedProtocol(_))
        ));
    }
}
