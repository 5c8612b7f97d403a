//! Error taxonomy for the proxy core.
//!
//! # Design Decisions
//! - Transport failures and transform failures are fatal to the request and
//!   degrade to a redirect toward the origin; neither is retried here.
//! - Decode failures never appear in this taxonomy: the decompression layer
//!   recovers them internally by substituting the pre-decode bytes.
//! - Anti-bot challenge statuses are not errors; they are a recognized
//!   alternate delivery path.

use thiserror::Error;

/// Errors raised while fetching from the origin.
#[derive(Debug, Error)]
pub enum TransportError {
    /// URL scheme outside the supported transports.
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// Primary-transport request failed (connect, timeout, redirect limit).
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// TCP connect for the streaming transport failed.
    #[error("stream connect failed: {0}")]
    Connect(#[from] std::io::Error),

    /// HTTP/2 protocol error on the streaming transport.
    #[error("stream error: {0}")]
    Stream(#[from] h2::Error),

    /// Target URL lacks a host, so no connection can be made.
    #[error("target URL has no host")]
    MissingHost,

    /// Outbound request could not be assembled for the streaming transport.
    #[error("invalid stream request: {0}")]
    Request(#[from] http::Error),
}

impl TransportError {
    /// True when the failure was a deadline or connect timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Http(e) => e.is_timeout(),
            TransportError::Connect(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

/// Errors raised by the recompression path.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The selected encoder rejected the payload.
    #[error("{codec} encoding failed: {source}")]
    Encode {
        codec: &'static str,
        source: std::io::Error,
    },

    /// The blocking encoder task was cancelled or panicked.
    #[error("encoder task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Any failure that collapses a request into the redirect fallback.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl ProxyError {
    /// True when the underlying failure was a transport timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProxyError::Transport(e) if e.is_timeout())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_timeout_is_classified_as_timeout() {
        let error = TransportError::from(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "connect timed out",
        ));
        assert!(error.is_timeout());
        assert!(ProxyError::from(error).is_timeout());
    }

    #[test]
    fn non_timeout_failures_are_not_classified_as_timeout() {
        assert!(!TransportError::MissingHost.is_timeout());

        let refused = TransportError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(!ProxyError::from(refused).is_timeout());
    }
}
