//! Construction options for [`RateLimiter`](super::RateLimiter).

use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LimiterError, Result};

/// Default window length: one minute.
pub const DEFAULT_INTERVAL_MS: u64 = 60_000;
/// Default number of distinct tokens tracked at once.
pub const DEFAULT_UNIQUE_TOKEN_PER_INTERVAL: usize = 500;

/// Window length and token cardinality cap for a limiter.
///
/// Both values are non-zero by construction, so a limiter can never be built
/// with an empty window or an empty token table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterOptions {
    /// Window length in milliseconds; counts reset when it rolls over
    #[serde(default = "default_interval_ms", alias = "interval")]
    pub interval_ms: NonZeroU64,

    /// Maximum number of distinct tokens tracked simultaneously
    #[serde(default = "default_unique_token_per_interval")]
    pub unique_token_per_interval: NonZeroUsize,
}

impl LimiterOptions {
    /// Build options from raw values, rejecting zeros.
    pub fn new(interval_ms: u64, unique_token_per_interval: usize) -> Result<Self> {
        let interval_ms = NonZeroU64::new(interval_ms).ok_or_else(|| {
            LimiterError::Config("interval must be a positive number of milliseconds".to_string())
        })?;
        let unique_token_per_interval =
            NonZeroUsize::new(unique_token_per_interval).ok_or_else(|| {
                LimiterError::Config("unique_token_per_interval must be positive".to_string())
            })?;

        Ok(Self {
            interval_ms,
            unique_token_per_interval,
        })
    }

    /// Window length as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.get())
    }
}

impl Default for LimiterOptions {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            unique_token_per_interval: default_unique_token_per_interval(),
        }
    }
}

fn default_interval_ms() -> NonZeroU64 {
    NonZeroU64::new(DEFAULT_INTERVAL_MS).unwrap()
}

fn default_unique_token_per_interval() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_UNIQUE_TOKEN_PER_INTERVAL).unwrap()
}
