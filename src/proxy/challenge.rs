//! Challenge-page detection.
//!
//! CDN anti-automation layers answer with a fixed set of status codes when
//! they intercept a request. Those responses carry a small challenge page in
//! the still-encoded body; the orchestration serves it untouched so the
//! client can render it or retry against the origin directly.

use http::StatusCode;

/// Status codes served by anti-automation layers in place of content.
pub const CHALLENGE_STATUS_CODES: [StatusCode; 2] =
    [StatusCode::FORBIDDEN, StatusCode::SERVICE_UNAVAILABLE];

/// True when the origin answered with a challenge or block page.
pub fn is_challenge(status: StatusCode) -> bool {
    CHALLENGE_STATUS_CODES.contains(&status)
}
