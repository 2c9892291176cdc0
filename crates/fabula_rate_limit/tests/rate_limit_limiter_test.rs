//! Tests for quota enforcement and retry behavior.

use fabula_error::{GeminiError, GeminiErrorKind};
use fabula_rate_limit::{RateLimiter, TierConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn tier(rpm: Option<u32>, max_concurrent: Option<u32>) -> TierConfig {
    TierConfig {
        name: "Test".to_string(),
        rpm,
        tpm: None,
        rpd: None,
        max_concurrent,
        models: HashMap::new(),
    }
}

#[tokio::test]
async fn test_unlimited_tier_never_blocks() {
    let limiter = RateLimiter::new(TierConfig::unlimited());

    for _ in 0..100 {
        assert!(limiter.try_acquire(10_000).is_some());
    }
}

#[tokio::test]
async fn test_rpm_burst_is_enforced() {
    let limiter = RateLimiter::new(tier(Some(2), None));

    assert!(limiter.try_acquire(1).is_some());
    assert!(limiter.try_acquire(1).is_some());
    assert!(limiter.try_acquire(1).is_none());
}

#[tokio::test]
async fn test_concurrency_slot_released_on_drop() {
    let limiter = RateLimiter::new(tier(None, Some(1)));

    let guard = limiter.try_acquire(1).unwrap();
    assert!(limiter.try_acquire(1).is_none());

    drop(guard);
    assert!(limiter.try_acquire(1).is_some());
}

#[tokio::test]
async fn test_tpm_budget_consumed_by_estimate() {
    let limiter = RateLimiter::new(TierConfig {
        tpm: Some(1_000),
        ..TierConfig::unlimited()
    });

    assert!(limiter.try_acquire(800).is_some());
    assert!(limiter.try_acquire(800).is_none());
}

#[tokio::test]
async fn test_acquire_larger_than_tpm_burst_does_not_hang() {
    let limiter = RateLimiter::new(TierConfig {
        tpm: Some(100),
        ..TierConfig::unlimited()
    });

    let _guard = limiter.acquire(10_000).await;
}

#[tokio::test]
async fn test_clones_share_quota() {
    let limiter = RateLimiter::new(tier(Some(1), None));
    let clone = limiter.clone();

    assert!(limiter.try_acquire(1).is_some());
    assert!(clone.try_acquire(1).is_none());
}

#[tokio::test]
async fn test_execute_returns_success_without_retry() {
    let limiter = RateLimiter::new(TierConfig::unlimited());
    let calls = Arc::new(AtomicUsize::new(0));

    let result: Result<&str, GeminiError> = limiter
        .execute(10, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("done")
            }
        })
        .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_execute_does_not_retry_permanent_errors() {
    let limiter = RateLimiter::new(TierConfig::unlimited());
    let calls = Arc::new(AtomicUsize::new(0));

    let result: Result<(), GeminiError> = limiter
        .execute(10, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GeminiError::new(GeminiErrorKind::HttpError {
                    status_code: 400,
                    message: "bad request".to_string(),
                }))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_execute_retries_transient_errors() {
    let limiter = RateLimiter::new(TierConfig::unlimited());
    let calls = Arc::new(AtomicUsize::new(0));

    let result: Result<u32, GeminiError> = limiter
        .execute(10, || {
            let calls = calls.clone();
            async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Err(GeminiError::new(GeminiErrorKind::HttpError {
                        status_code: 503,
                        message: "overloaded".to_string(),
                    }))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_execute_gives_up_after_max_retries() {
    let limiter = RateLimiter::new(TierConfig::unlimited());
    let calls = Arc::new(AtomicUsize::new(0));

    // 500 allows 3 retries after the first attempt.
    let result: Result<(), GeminiError> = limiter
        .execute(10, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GeminiError::new(GeminiErrorKind::HttpError {
                    status_code: 500,
                    message: "internal".to_string(),
                }))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}
