//! Core rate limiter implementation.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::clock::{Clock, SystemClock};
use super::counter::{TokenEntry, WindowId};
use super::options::LimiterOptions;
use crate::error::RateLimitExceeded;

/// Usage reported for an allowed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    /// The ceiling the caller asked for
    pub limit: u64,
    /// Requests counted in the window, including this one
    pub count: u64,
    /// Requests still allowed in the window
    pub remaining: u64,
    /// Time left until the window rolls over
    pub reset_after: Duration,
}

/// Fixed-window rate limiter keyed by caller-supplied tokens.
///
/// Tracks at most `unique_token_per_interval` tokens; beyond that the least
/// recently checked token is forgotten and starts from zero if it returns.
/// Counts reset lazily the first time a token is checked in a new window.
///
/// Build one per process and share it behind an `Arc`. A fresh limiter per
/// request would never deny anything.
pub struct RateLimiter {
    /// Window length and token cap
    options: LimiterOptions,
    /// Time source for window identifiers
    clock: Arc<dyn Clock>,
    /// Per-token tallies in recency order
    tokens: Mutex<LruCache<String, TokenEntry>>,
}

impl RateLimiter {
    /// Create a limiter driven by the system clock.
    pub fn new(options: LimiterOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    /// Create a limiter driven by the given clock.
    pub fn with_clock(options: LimiterOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: Mutex::new(LruCache::new(options.unique_token_per_interval)),
            options,
            clock,
        }
    }

    /// Count one request for `token` and check it against `limit`.
    ///
    /// The request is counted whether or not it is allowed, so a caller that
    /// keeps retrying past the limit stays blocked until the window rolls over.
    pub fn check(&self, limit: u64, token: &str) -> Result<Usage, RateLimitExceeded> {
        let now = self.clock.now_millis();
        let window = WindowId::at(now, self.options.interval_ms);
        let reset_after = window.remaining(now, self.options.interval_ms);

        let count = {
            let mut tokens = self.tokens.lock();

            let (key, mut entry) = match tokens.pop_entry(token) {
                Some((key, entry)) if entry.is_current(window) => (key, entry),
                Some((key, stale)) => {
                    trace!(
                        token = %key,
                        stale_window = %stale.window(),
                        window = %window,
                        "Window rolled over, resetting token"
                    );
                    (key, TokenEntry::new(window))
                }
                None => (token.to_owned(), TokenEntry::new(window)),
            };

            let count = entry.increment();

            // The entry was popped above, so a full cache evicts some other token.
            if let Some((evicted, _)) = tokens.push(key, entry) {
                debug!(evicted = %evicted, "Evicted least recently used token");
            }

            count
        };

        trace!(
            token = %token,
            count = count,
            limit = limit,
            window = %window,
            "Checked rate limit"
        );

        if count <= limit {
            Ok(Usage {
                limit,
                count,
                remaining: limit - count,
                reset_after,
            })
        } else {
            debug!(
                token = %token,
                count = count,
                limit = limit,
                "Rate limit exceeded"
            );
            Err(RateLimitExceeded {
                limit,
                count,
                retry_after: reset_after,
            })
        }
    }

    /// Current-window usage for `token` without counting a request.
    ///
    /// Does not change eviction order. Returns `None` when the token is not
    /// tracked or its tally belongs to an earlier window.
    pub fn usage(&self, limit: u64, token: &str) -> Option<Usage> {
        let now = self.clock.now_millis();
        let window = WindowId::at(now, self.options.interval_ms);

        let tokens = self.tokens.lock();
        let entry = tokens.peek(token).filter(|entry| entry.is_current(window))?;

        Some(Usage {
            limit,
            count: entry.count(),
            remaining: limit.saturating_sub(entry.count()),
            reset_after: window.remaining(now, self.options.interval_ms),
        })
    }

    /// Drop every tally left over from an earlier window.
    ///
    /// Returns the number of tokens removed. Stale tallies are already
    /// ignored by [`check`](Self::check); this only reclaims their memory early.
    pub fn purge_stale(&self) -> usize {
        let window = WindowId::at(self.clock.now_millis(), self.options.interval_ms);
        let mut tokens = self.tokens.lock();

        let stale: Vec<String> = tokens
            .iter()
            .filter(|(_, entry)| !entry.is_current(window))
            .map(|(token, _)| token.clone())
            .collect();

        for token in &stale {
            tokens.pop(token);
        }

        if !stale.is_empty() {
            debug!(purged = stale.len(), window = %window, "Purged stale tokens");
        }

        stale.len()
    }

    /// Forget every token.
    pub fn clear(&self) {
        self.tokens.lock().clear();
    }

    /// Number of tokens currently tracked.
    pub fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    /// Whether no token is tracked.
    pub fn is_empty(&self) -> bool {
        self.tokens.lock().is_empty()
    }

    /// Maximum number of tokens tracked at once.
    pub fn capacity(&self) -> NonZeroUsize {
        self.options.unique_token_per_interval
    }

    /// The options this limiter was built with.
    pub fn options(&self) -> &LimiterOptions {
        &self.options
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(LimiterOptions::default())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
