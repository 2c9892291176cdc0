//! Rate limiter built on governor and a Tokio semaphore.
//!
//! Governor's GCRA enforces the RPM, TPM and RPD quotas without locks; the
//! semaphore caps the number of requests in flight.

use crate::Tier;
use fabula_error::RetryableError;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::fmt::Display;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, info, warn};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter that enforces every quota a [`Tier`] declares.
///
/// - **RPM** (requests per minute) and **TPM** (tokens per minute) through
///   governor quotas
/// - **RPD** (requests per day) through a daily governor quota
/// - **Concurrent requests** through a semaphore
///
/// Cloning is cheap and clones share the same quotas.
///
/// # Example
///
/// ```
/// use fabula_rate_limit::{RateLimiter, TierConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let limiter = RateLimiter::new(TierConfig::unlimited());
/// let guard = limiter.acquire(1000).await;
/// assert_eq!(limiter.inner().name, "Unlimited");
/// drop(guard);
/// # }
/// ```
#[derive(Clone)]
pub struct RateLimiter<T: Tier> {
    inner: T,
    rpm_limiter: Option<Arc<DirectRateLimiter>>,
    tpm_limiter: Option<Arc<DirectRateLimiter>>,
    rpd_limiter: Option<Arc<DirectRateLimiter>>,
    concurrent_semaphore: Arc<Semaphore>,
}

impl<T: Tier> RateLimiter<T> {
    /// Create a limiter enforcing every non-`None` limit of `tier`.
    pub fn new(tier: T) -> Self {
        let rpm_limiter = tier.rpm().and_then(NonZeroU32::new).map(|n| {
            Arc::new(GovernorRateLimiter::direct(Quota::per_minute(n)))
        });

        // Governor counts cells in u32.
        let tpm_limiter = tier
            .tpm()
            .and_then(|tpm| NonZeroU32::new(tpm.min(u32::MAX as u64) as u32))
            .map(|n| Arc::new(GovernorRateLimiter::direct(Quota::per_minute(n))));

        let rpd_limiter = tier.rpd().and_then(NonZeroU32::new).and_then(|n| {
            let period = Duration::from_secs(86_400) / n.get();
            Quota::with_period(period)
                .map(|quota| Arc::new(GovernorRateLimiter::direct(quota.allow_burst(n))))
        });

        let max_concurrent = tier
            .max_concurrent()
            .map(|n| n.max(1) as usize)
            .unwrap_or(Semaphore::MAX_PERMITS);

        debug!(
            tier = tier.name(),
            rpm = ?tier.rpm(),
            tpm = ?tier.tpm(),
            rpd = ?tier.rpd(),
            max_concurrent,
            "Created rate limiter"
        );

        Self {
            inner: tier,
            rpm_limiter,
            tpm_limiter,
            rpd_limiter,
            concurrent_semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// The tier this limiter enforces.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn token_cells(estimated_tokens: u64) -> NonZeroU32 {
        NonZeroU32::new((estimated_tokens.min(u32::MAX as u64) as u32).max(1))
            .unwrap_or(NonZeroU32::MIN)
    }

    /// Wait until every quota allows one more request of `estimated_tokens`.
    ///
    /// The returned guard holds a concurrency slot until dropped.
    pub async fn acquire(&self, estimated_tokens: u64) -> RateLimiterGuard {
        if let Some(limiter) = &self.rpm_limiter {
            limiter.until_ready().await;
        }

        if let Some(limiter) = &self.tpm_limiter {
            let cells = Self::token_cells(estimated_tokens);
            if limiter.until_n_ready(cells).await.is_err() {
                // More tokens than the whole burst; wait for a single cell instead.
                debug!(
                    estimated_tokens,
                    "Request exceeds TPM burst, waiting for one cell"
                );
                limiter.until_ready().await;
            }
        }

        if let Some(limiter) = &self.rpd_limiter {
            limiter.until_ready().await;
        }

        // Slot last so waiting on quotas doesn't hold one.
        let permit = self.concurrent_semaphore.clone().acquire_owned().await.ok();

        RateLimiterGuard { _permit: permit }
    }

    /// Acquire without waiting. Returns `None` if any quota would block.
    pub fn try_acquire(&self, estimated_tokens: u64) -> Option<RateLimiterGuard> {
        if let Some(limiter) = &self.rpm_limiter {
            limiter.check().ok()?;
        }

        if let Some(limiter) = &self.tpm_limiter {
            limiter
                .check_n(Self::token_cells(estimated_tokens))
                .ok()?
                .ok()?;
        }

        if let Some(limiter) = &self.rpd_limiter {
            limiter.check().ok()?;
        }

        let permit = self.concurrent_semaphore.clone().try_acquire_owned().ok()?;

        Some(RateLimiterGuard {
            _permit: Some(permit),
        })
    }

    /// Run `operation` under the rate limit, retrying transient failures.
    ///
    /// The first attempt runs directly. If it fails with a retryable error,
    /// the backoff is chosen from that error's
    /// [`retry_strategy_params`](RetryableError::retry_strategy_params):
    /// exponential with factor 2, capped, jittered. Permanent errors return
    /// immediately.
    pub async fn execute<F, Fut, R, E>(&self, estimated_tokens: u64, operation: F) -> Result<R, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: RetryableError + Display,
    {
        let first = {
            let _guard = self.acquire(estimated_tokens).await;
            operation().await
        };

        let error = match first {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => {
                warn!(error = %e, "Permanent error, failing immediately");
                return Err(e);
            }
            Err(e) => e,
        };

        let (initial_ms, max_retries, max_delay_secs) = error.retry_strategy_params();
        info!(
            error = %error,
            tier = self.inner.name(),
            initial_backoff_ms = initial_ms,
            max_retries,
            max_delay_secs,
            "Transient error, retrying with backoff"
        );

        let mut retry_strategy = ExponentialBackoff::from_millis(initial_ms)
            .factor(2)
            .max_delay(Duration::from_secs(max_delay_secs))
            .map(jitter)
            .take(max_retries);

        // Retry::spawn attempts immediately, so the first backoff happens here.
        match retry_strategy.next() {
            Some(delay) => tokio::time::sleep(delay).await,
            None => return Err(error),
        }

        Retry::spawn(retry_strategy, || async {
            let _guard = self.acquire(estimated_tokens).await;

            match operation().await {
                Ok(value) => Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, "Transient error, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Permanent error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await
    }
}

/// Holds a concurrency slot until dropped.
pub struct RateLimiterGuard {
    _permit: Option<OwnedSemaphorePermit>,
}
