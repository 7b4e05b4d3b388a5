//! Token Limiter - In-process Request Rate Limiting
//!
//! This crate counts requests per caller-supplied token (typically a client
//! address) in fixed time windows and rejects them once a per-window ceiling
//! is exceeded. Memory is bounded by tracking a fixed number of tokens and
//! evicting the least recently used one when the table is full.
//!
//! ```
//! use token_limiter::ratelimit::{LimiterOptions, RateLimiter};
//!
//! let limiter = RateLimiter::new(LimiterOptions::new(60_000, 500)?);
//!
//! assert!(limiter.check(2, "10.0.0.1").is_ok());
//! assert!(limiter.check(2, "10.0.0.1").is_ok());
//! assert!(limiter.check(2, "10.0.0.1").is_err());
//! # Ok::<(), token_limiter::error::LimiterError>(())
//! ```

pub mod config;
pub mod error;
pub mod ratelimit;

pub use error::{LimiterError, RateLimitExceeded};
pub use ratelimit::{RateLimiter, RateLimiterBackend, Usage};
