use anyhow::{bail, Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::task::yield_now;
use tokio::time::sleep;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);

/// Bounded exponential backoff applied independently to every pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Delay slept after the `failed_attempt`-th failure (1-based):
    /// `min(base * 2^failed_attempt, max)`.
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(failed_attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            bail!("retry max_attempts must be greater than 0");
        }
        if self.base_delay.is_zero() {
            bail!("retry base_delay must be greater than 0");
        }
        if self.max_delay < self.base_delay {
            bail!("retry max_delay must be at least base_delay");
        }
        Ok(())
    }
}

/// Final failure of a retried operation.
#[derive(Debug)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub source: Error,
}

/// Runs `operation` until it succeeds or `policy.max_attempts` is reached.
/// `on_retry(attempt, delay, err)` fires before each backoff sleep, never
/// after the final failure.
pub async fn retry_with_backoff<T, F, Fut, L>(
    policy: RetryPolicy,
    mut operation: F,
    mut on_retry: L,
) -> std::result::Result<T, RetryExhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    L: FnMut(u32, Duration, &Error),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        source: err,
                    });
                }

                let delay = policy.delay_for(attempt);
                on_retry(attempt, delay, &err);
                sleep_or_yield(delay).await;
            }
        }
    }
}

async fn sleep_or_yield(delay: Duration) {
    if delay.is_zero() {
        yield_now().await;
    } else {
        sleep(delay).await;
    }
}
