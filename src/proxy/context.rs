//! Per-request state and the outbound request derivation.
//!
//! # Responsibilities
//! - Capture the inbound header subset the proxy forwards
//! - Synthesize the fixed outbound header set presented to origins
//! - Carry post-fetch metadata for the delivery policy

use std::net::IpAddr;
use std::time::Duration;

use http::{header, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::config::schema::UpstreamConfig;
use crate::encoding::AcceptedEncodings;

/// Fixed browser identity presented to origins.
pub const OUTBOUND_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; rv:121.0) Gecko/20100101 Firefox/121.0";

/// Fixed Accept list favoring HTML, XML and images.
pub const OUTBOUND_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/*,*/*;q=0.8";

/// Every encoding the decode layer can resolve.
pub const OUTBOUND_ACCEPT_ENCODING: &str = "gzip, deflate, br, lzma, lzma2, zstd";

/// Cache-disabling directives for the origin fetch.
pub const OUTBOUND_CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// Hop marker appended to outbound requests.
pub const OUTBOUND_VIA: &str = "1.1 compression-proxy";

/// State owned by a single proxied request.
///
/// `origin_type` and `origin_size` are populated by the orchestration after
/// the fetch and decode stages; the delivery policy reads them.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub url: Url,
    pub cookie: Option<HeaderValue>,
    pub dnt: Option<HeaderValue>,
    pub referer: Option<HeaderValue>,
    pub forwarded_for: String,
    pub accepts: AcceptedEncodings,
    pub origin_type: Option<String>,
    pub origin_size: Option<usize>,
}

impl RequestContext {
    /// Capture the forwarded header subset from the inbound request. The
    /// peer address is the forwarded-for fallback when the client did not
    /// send one.
    pub fn new(request_id: String, url: Url, headers: &HeaderMap, peer: IpAddr) -> Self {
        let forwarded_for = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| peer.to_string());
        let accepts = AcceptedEncodings::parse(
            headers
                .get(header::ACCEPT_ENCODING)
                .and_then(|value| value.to_str().ok()),
        );

        Self {
            request_id,
            url,
            cookie: headers.get(header::COOKIE).cloned(),
            dnt: headers.get("dnt").cloned(),
            referer: headers.get(header::REFERER).cloned(),
            forwarded_for,
            accepts,
            origin_type: None,
            origin_size: None,
        }
    }
}

/// Immutable description of the upstream fetch, derived once per request.
#[derive(Debug, Clone)]
pub struct OutboundRequestSpec {
    pub url: Url,
    /// Header set for the primary transport.
    pub headers: HeaderMap,
    /// Whitelisted subset for the streaming transport: the client's own
    /// cookie, dnt and referer plus the synthetic user-agent.
    pub stream_headers: HeaderMap,
    pub timeout: Duration,
    pub max_redirects: usize,
}

impl OutboundRequestSpec {
    /// Synthesize the outbound header sets.
    ///
    /// The primary set overlays the client's cookie and referer onto the
    /// fixed identity, then forces `dnt: 1` regardless of what the client
    /// sent. The streaming subset keeps the client's own dnt instead.
    pub fn derive(ctx: &RequestContext, upstream: &UpstreamConfig) -> Self {
        let dnt = HeaderName::from_static("dnt");
        let forwarded = HeaderName::from_static("x-forwarded-for");

        let mut headers = HeaderMap::new();
        if let Some(cookie) = &ctx.cookie {
            headers.insert(header::COOKIE, cookie.clone());
        }
        if let Some(referer) = &ctx.referer {
            headers.insert(header::REFERER, referer.clone());
        }
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(OUTBOUND_USER_AGENT),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static(OUTBOUND_ACCEPT));
        headers.insert(
            header::ACCEPT_ENCODING,
            HeaderValue::from_static(OUTBOUND_ACCEPT_ENCODING),
        );
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(OUTBOUND_CACHE_CONTROL),
        );
        headers.insert(dnt.clone(), HeaderValue::from_static("1"));
        if let Ok(value) = HeaderValue::from_str(&ctx.forwarded_for) {
            headers.insert(forwarded, value);
        }
        headers.insert(header::VIA, HeaderValue::from_static(OUTBOUND_VIA));

        let mut stream_headers = HeaderMap::new();
        if let Some(cookie) = &ctx.cookie {
            stream_headers.insert(header::COOKIE, cookie.clone());
        }
        if let Some(value) = &ctx.dnt {
            stream_headers.insert(dnt, value.clone());
        }
        if let Some(referer) = &ctx.referer {
            stream_headers.insert(header::REFERER, referer.clone());
        }
        stream_headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(OUTBOUND_USER_AGENT),
        );

        Self {
            url: ctx.url.clone(),
            headers,
            stream_headers,
            timeout: Duration::from_secs(upstream.request_timeout_secs),
            max_redirects: upstream.max_redirects,
        }
    }
}
