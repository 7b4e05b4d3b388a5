//! Fixed-window bookkeeping for a single token.

use std::num::NonZeroU64;
use std::time::Duration;

/// Identifier of a fixed window, `floor(now / interval)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(u64);

impl WindowId {
    /// The window containing `now_millis`.
    pub fn at(now_millis: u64, interval: NonZeroU64) -> Self {
        Self(now_millis / interval.get())
    }

    /// Raw window number.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Time left in this window as seen from `now_millis`.
    ///
    /// Returns zero once `now_millis` has moved past the window.
    pub fn remaining(self, now_millis: u64, interval: NonZeroU64) -> Duration {
        let end = self.0.saturating_add(1).saturating_mul(interval.get());
        Duration::from_millis(end.saturating_sub(now_millis))
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request tally for one token within its active window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEntry {
    /// Requests seen in `window`, denied ones included
    count: u64,
    /// Window this tally belongs to
    window: WindowId,
}

impl TokenEntry {
    /// A fresh, zeroed entry for `window`.
    pub fn new(window: WindowId) -> Self {
        Self { count: 0, window }
    }

    /// Record one request and return the new count.
    pub fn increment(&mut self) -> u64 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    /// Requests recorded so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// The window this entry counts against.
    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Whether this entry still belongs to `window`.
    ///
    /// Any mismatch counts as stale, including a clock that stepped backwards.
    pub fn is_current(&self, window: WindowId) -> bool {
        self.window == window
    }
}
