//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use threadgrab_core::HarvestSettings;

/// How many extra attempts a failed operation gets, and how long to wait
/// between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub retry_budget: u32,
    /// Delay before the first retry; zero disables sleeping.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&HarvestSettings::default())
    }
}

impl From<&HarvestSettings> for RetryPolicy {
    fn from(settings: &HarvestSettings) -> Self {
        Self {
            retry_budget: settings.retry_budget,
            base_delay: settings.retry_base_delay,
            max_delay: settings.retry_max_delay,
        }
    }
}

/// The last error once an operation stops being retried.
#[derive(Debug)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub error: E,
}

impl RetryPolicy {
    pub fn immediate(retry_budget: u32) -> Self {
        Self {
            retry_budget,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry_budget.saturating_add(1)
    }

    /// Delay after the 1-based `attempt` failed: `base * 2^(attempt-1)`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }

    /// Runs `op` until it succeeds, returns a non-retryable error, or the
    /// budget is spent. `op` receives the 1-based attempt number and
    /// `on_retry` is told about every failure that will be retried.
    pub async fn run<T, E, F, Fut>(
        &self,
        mut op: F,
        is_retryable: impl Fn(&E) -> bool,
        mut on_retry: impl FnMut(u32, &E),
    ) -> Result<(T, u32), RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1u32;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok((value, attempt)),
                Err(error) => {
                    if attempt >= self.max_attempts() || !is_retryable(&error) {
                        return Err(RetryError {
                            attempts: attempt,
                            error,
                        });
                    }
                    on_retry(attempt, &error);
                    let delay = self.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
