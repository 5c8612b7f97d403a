//! Compression Proxy Library
//!
//! A forwarding proxy that fetches a remote resource on behalf of a client,
//! normalizes its transport encoding, and either recompresses the payload or
//! passes it through unchanged.

pub mod config;
pub mod encoding;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::{TransformError, TransportError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
