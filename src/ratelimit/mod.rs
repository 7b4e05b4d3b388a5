//! Rate limiting logic and state management.

mod backend;
mod clock;
mod counter;
mod limiter;
mod options;

pub use backend::RateLimiterBackend;
pub use clock::{Clock, ManualClock, SystemClock};
pub use counter::{TokenEntry, WindowId};
pub use limiter::{RateLimiter, Usage};
pub use options::{LimiterOptions, DEFAULT_INTERVAL_MS, DEFAULT_UNIQUE_TOKEN_PER_INTERVAL};
