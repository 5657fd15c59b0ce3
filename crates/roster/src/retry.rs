// Retry-with-backoff for the sign-in phase.
//
// Exponential backoff with an optional jitter component and a hard delay
// cap. Cancellation interrupts the backoff sleeps, never the attempt
// itself.

use rand::RngExt;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempt budget, counting the first try. `1` disables retries.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each retry after that.
    pub base_delay: Duration,
    /// Hard cap on any single computed delay.
    pub max_delay: Duration,
    /// When true, adds random jitter of [0, base_delay/2) to spread out
    /// simultaneous retries.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Policy that gives up after the first failure.
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Compute the delay after a given attempt number (0-indexed).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // 2^attempt via a checked shift so misconfigured attempt counts
        // saturate instead of overflowing.
        let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let exp_delay = self
            .base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay);
        let capped = exp_delay.min(self.max_delay);

        if !self.jitter {
            return capped;
        }

        // Jitter is bounded so the final delay never exceeds `max_delay`.
        let jitter_range_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX) / 2;
        if jitter_range_ms == 0 {
            return capped;
        }
        let remaining_ms =
            u64::try_from(self.max_delay.saturating_sub(capped).as_millis()).unwrap_or(0);
        let jitter_limit_ms = jitter_range_ms.min(remaining_ms);
        if jitter_limit_ms == 0 {
            return capped;
        }

        let jitter_ms = rand::rng().random_range(0..jitter_limit_ms);
        (capped + Duration::from_millis(jitter_ms)).min(self.max_delay)
    }
}

/// Result of a single attempt, reported by the operation closure.
pub enum RetryAction<T, E> {
    /// The attempt succeeded.
    Success(T),
    /// The attempt failed in a way another try might fix.
    Retry(E),
    /// The attempt failed permanently; stop immediately.
    Fail(E),
}

/// Why a retried operation returned nothing.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// The cancellation token fired before or between attempts.
    #[error("cancelled while waiting to retry")]
    Cancelled,
    /// A permanent failure, or the last error once the budget ran out.
    #[error(transparent)]
    Inner(E),
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::Cancelled => None,
            RetryError::Inner(err) => Some(err),
        }
    }
}

/// Execute an async operation under a [`RetryPolicy`].
///
/// The closure receives the current attempt number (0-indexed) and reports
/// back through [`RetryAction`]. A budget of zero is treated as one.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    operation: F,
) -> Result<T, RetryError<E>>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = RetryAction<T, E>>,
    E: std::error::Error + 'static,
{
    let budget = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        if token.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        match operation(attempt).await {
            RetryAction::Success(value) => return Ok(value),
            RetryAction::Fail(err) => return Err(RetryError::Inner(err)),
            RetryAction::Retry(err) => {
                if attempt + 1 >= budget {
                    return Err(RetryError::Inner(err));
                }
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    attempt = attempt + 1,
                    budget,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying after transient failure"
                );
                tokio::select! {
                    _ = token.cancelled() => return Err(RetryError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("probe failure: {0}")]
    struct ProbeError(&'static str);

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_secs(1),
            jitter: false,
        }
    }

    #[test]
    fn delay_doubles_and_respects_the_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            jitter: false,
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        // 100ms * 2^10 would be 102s; the cap wins.
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[test]
    fn jittered_delay_stays_within_bounds() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter: true,
        };
        for _ in 0..32 {
            let delay = policy.delay_for_attempt(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay < Duration::from_millis(150));
        }
    }

    #[tokio::test]
    async fn success_on_the_first_attempt_needs_no_budget() {
        let token = CancellationToken::new();
        let result: Result<u32, RetryError<ProbeError>> =
            retry_with_backoff(&quick_policy(1), &token, |_| async {
                RetryAction::Success(42)
            })
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn exhausted_budget_returns_the_last_error() {
        let token = CancellationToken::new();
        let attempts = AtomicU32::new(0);
        let result: Result<u32, _> = retry_with_backoff(&quick_policy(5), &token, |_| {
            attempts.fetch_add(1, Ordering::Relaxed);
            async { RetryAction::Retry(ProbeError("flaky")) }
        })
        .await;
        assert!(matches!(result, Err(RetryError::Inner(_))));
        assert_eq!(attempts.load(Ordering::Relaxed), 5);
    }

    #[tokio::test]
    async fn permanent_failures_stop_after_one_attempt() {
        let token = CancellationToken::new();
        let attempts = AtomicU32::new(0);
        let result: Result<u32, _> = retry_with_backoff(&quick_policy(5), &token, |_| {
            attempts.fetch_add(1, Ordering::Relaxed);
            async { RetryAction::Fail(ProbeError("hard no")) }
        })
        .await;
        assert!(matches!(result, Err(RetryError::Inner(_))));
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn budget_of_three_permits_success_on_the_third_attempt() {
        let token = CancellationToken::new();
        let attempts = AtomicU32::new(0);
        let result = retry_with_backoff(&quick_policy(3), &token, |attempt| {
            attempts.fetch_add(1, Ordering::Relaxed);
            async move {
                if attempt < 2 {
                    RetryAction::Retry(ProbeError("not yet"))
                } else {
                    RetryAction::Success("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn cancelled_token_preempts_the_first_attempt() {
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<u32, RetryError<ProbeError>> =
            retry_with_backoff(&quick_policy(3), &token, |_| async {
                RetryAction::Success(1)
            })
            .await;
        assert!(matches!(result, Err(RetryError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_backoff_sleep() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
            jitter: false,
        };
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let result: Result<u32, _> = retry_with_backoff(&policy, &token, |_| async {
            RetryAction::Retry(ProbeError("always"))
        })
        .await;
        assert!(matches!(result, Err(RetryError::Cancelled)));
        // Far below the 60s backoff: the sleep was interrupted.
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn zero_budget_still_runs_one_attempt() {
        let token = CancellationToken::new();
        let attempts = AtomicU32::new(0);
        let result: Result<u32, _> = retry_with_backoff(&quick_policy(0), &token, |_| {
            attempts.fetch_add(1, Ordering::Relaxed);
            async { RetryAction::Retry(ProbeError("once")) }
        })
        .await;
        assert!(matches!(result, Err(RetryError::Inner(_))));
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
    }
}
