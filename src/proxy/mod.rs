//! Request orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (url param + header subset)
//!     → context.rs (RequestContext, OutboundRequestSpec synthesis)
//!     → handler.rs (fetch, challenge check, decode, route)
//!     → challenge.rs (403/503 bypass with the untouched body)
//!     → policy.rs (transform-candidacy decision, terminal writer dispatch)
//!     → Response to client
//!
//! Any error inside handler.rs degrades to a redirect toward the origin.
//! ```
//!
//! # Design Decisions
//! - All per-request state lives in values owned by the request task; no
//!   shared mutable state between concurrent requests.
//! - The candidacy predicate is a trait seam so deployments and tests can
//!   swap the policy without touching the orchestration.

pub mod challenge;
pub mod context;
pub mod handler;
pub mod policy;

pub use context::{OutboundRequestSpec, RequestContext};
pub use policy::{CompressionCandidates, TransformPolicy};
