//! Streaming-transport fetch over cleartext HTTP/2.
//!
//! # Responsibilities
//! - Open one dedicated connection per call to the target's authority
//! - Send a single GET carrying only the whitelisted header subset
//! - Accumulate DATA frames into one buffer, releasing flow-control window
//!   as chunks arrive
//!
//! # Design Decisions
//! - The connection driver task is held by a guard that aborts it on drop,
//!   so the connection is torn down on every exit path.

use bytes::BytesMut;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use crate::error::{TransportError, TransportResult};
use crate::proxy::context::OutboundRequestSpec;
use crate::upstream::OriginResponse;

/// Default port for the streaming transport when the URL names none.
const DEFAULT_PORT: u16 = 80;

/// Aborts the connection driver when the fetch scope ends.
struct DriverGuard {
    task: JoinHandle<()>,
}

impl Drop for DriverGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Fetch the target over a dedicated HTTP/2 connection.
pub(crate) async fn fetch(spec: &OutboundRequestSpec) -> TransportResult<OriginResponse> {
    let host = spec
        .url
        .host_str()
        .ok_or(TransportError::MissingHost)?
        .to_string();
    let port = spec.url.port().unwrap_or(DEFAULT_PORT);

    let tcp = TcpStream::connect((host.as_str(), port)).await?;
    let (client, connection) = h2::client::handshake(tcp).await?;
    let _driver = DriverGuard {
        task: tokio::spawn(async move {
            if let Err(error) = connection.await {
                tracing::debug!(error = %error, "Stream connection closed with error");
            }
        }),
    };

    let mut client = client.ready().await?;
    let request = build_request(spec, &host, port)?;
    let (response, _) = client.send_request(request, true)?;
    let (parts, mut body) = response.await?.into_parts();

    let mut data = BytesMut::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk?;
        body.flow_control().release_capacity(chunk.len())?;
        data.extend_from_slice(&chunk);
    }

    Ok(OriginResponse {
        status: parts.status,
        headers: parts.headers,
        body: data.freeze(),
    })
}

/// Build the GET request. Only the path travels as `:path`; the query, if
/// any, is dropped by this transport.
fn build_request(
    spec: &OutboundRequestSpec,
    host: &str,
    port: u16,
) -> TransportResult<http::Request<()>> {
    let uri = format!("http://{}:{}{}", host, port, spec.url.path());
    let mut request = http::Request::builder()
        .method(http::Method::GET)
        .uri(uri)
        .body(())?;
    *request.headers_mut() = spec.stream_headers.clone();
    Ok(request)
}
