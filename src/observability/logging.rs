//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config and environment
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` overrides the configured level when set

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// The configured level applies to this crate and the HTTP middleware;
/// `RUST_LOG` takes precedence when present in the environment.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("compression_proxy={level},tower_http={level}"))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
