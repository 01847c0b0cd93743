//! Shared infrastructure: rate limiting, retry with backoff, telemetry.

pub mod rate_limit;
pub mod retry;
pub mod telemetry;

pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use retry::retry_with_backoff;
