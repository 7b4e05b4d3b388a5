//! Error types for the token limiter.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while building a limiter or loading its configuration.
///
/// None of these are produced by [`RateLimiter::check`](crate::ratelimit::RateLimiter::check);
/// a denied request is reported through [`RateLimitExceeded`] instead.
#[derive(Error, Debug)]
pub enum LimiterError {
    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure while layering configuration sources
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for limiter setup operations.
pub type Result<T> = std::result::Result<T, LimiterError>;

/// A token used up its allotment for the current window.
///
/// The rejected request has already been counted, so `count` is always
/// greater than `limit`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Rate limit exceeded: {count} requests against a limit of {limit}, retry in {}ms", .retry_after.as_millis())]
pub struct RateLimitExceeded {
    /// The ceiling the caller asked for
    pub limit: u64,
    /// Requests counted in the window, including this one
    pub count: u64,
    /// Time left until the window rolls over
    pub retry_after: Duration,
}
