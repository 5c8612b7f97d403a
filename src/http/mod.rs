//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, routes)
//!     → request.rs (request ID, target URL extraction)
//!     → [proxy orchestration fetches and resolves the payload]
//!     → response.rs (header copy, terminal writers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
