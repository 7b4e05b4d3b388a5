//! Async facade over the rate limiter.

use async_trait::async_trait;

use super::limiter::{RateLimiter, Usage};
use crate::error::RateLimitExceeded;

/// Trait for rate limiter implementations used from async request handlers.
///
/// A check settles immediately: `Ok` means the request may proceed and
/// `Err` means the handler should answer with a rate-limit status.
#[async_trait]
pub trait RateLimiterBackend: Send + Sync {
    /// Count one request for `token` and check it against `limit`.
    async fn check_rate_limit(
        &self,
        limit: u64,
        token: &str,
    ) -> Result<Usage, RateLimitExceeded>;
}

#[async_trait]
impl RateLimiterBackend for RateLimiter {
    async fn check_rate_limit(
        &self,
        limit: u64,
        token: &str,
    ) -> Result<Usage, RateLimitExceeded> {
        self.check(limit, token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join_all;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::ratelimit::LimiterOptions;

    fn shared_limiter() -> Arc<dyn RateLimiterBackend> {
        Arc::new(RateLimiter::new(LimiterOptions::new(60_000, 500).unwrap()))
    }

    #[tokio::test]
    async fn test_backend_resolves_then_rejects() {
        let backend = shared_limiter();

        for _ in 0..5 {
            assert_ok!(backend.check_rate_limit(5, "test-token-1").await);
        }
        let err = assert_err!(backend.check_rate_limit(5, "test-token-1").await);
        assert_eq!(err.count, 6);
    }

    #[tokio::test]
    async fn test_backend_separates_tokens() {
        let backend = shared_limiter();

        assert_ok!(backend.check_rate_limit(2, "user-A").await);
        assert_ok!(backend.check_rate_limit(2, "user-A").await);
        assert_err!(backend.check_rate_limit(2, "user-A").await);

        assert_ok!(backend.check_rate_limit(2, "user-B").await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tasks_admit_exactly_limit() {
        let backend = shared_limiter();

        let handles = (0..100).map(|_| {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move { backend.check_rate_limit(30, "10.0.0.1").await })
        });

        let results = join_all(handles).await;
        let allowed = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
        let denied = results.iter().filter(|r| matches!(r, Ok(Err(_)))).count();

        assert_eq!(allowed, 30);
        assert_eq!(denied, 70);
    }
}
