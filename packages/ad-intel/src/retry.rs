//! Bounded retry with a backoff schedule.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `attempt × step`: 5s, 10s, 15s, ...
    Linear(Duration),
    Fixed(Duration),
}

/// How many times to try an external call and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::linear(5, Duration::from_secs(5))
    }
}

impl RetryPolicy {
    pub fn linear(max_attempts: u32, step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Linear(step),
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Fixed(delay),
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Linear(step) => step.saturating_mul(attempt),
            Backoff::Fixed(delay) => delay,
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// attempts run out. The attempt number is passed to `op`.
    pub async fn run<T, E, F, Fut, R>(&self, mut op: F, should_retry: R) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && should_retry(&err) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_secs = delay.as_secs_f64(),
                        error = %err,
                        "Retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Busy,
        Fatal,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    #[test]
    fn delay_schedules() {
        let linear = RetryPolicy::linear(5, Duration::from_secs(5));
        assert_eq!(linear.delay_for(1), Duration::from_secs(5));
        assert_eq!(linear.delay_for(4), Duration::from_secs(20));

        let fixed = RetryPolicy::fixed(5, Duration::from_secs(5));
        assert_eq!(fixed.delay_for(1), Duration::from_secs(5));
        assert_eq!(fixed.delay_for(4), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_with_linear_backoff_then_succeeds() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = RetryPolicy::linear(5, Duration::from_secs(5))
            .run(
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if attempt < 3 {
                            Err(TestError::Busy)
                        } else {
                            Ok(attempt)
                        }
                    }
                },
                |e| *e == TestError::Busy,
            )
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 5s after attempt 1, 10s after attempt 2
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_error_when_exhausted() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), _> = RetryPolicy::fixed(5, Duration::from_secs(5))
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(TestError::Busy) }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Err(TestError::Busy));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // No sleep after the final attempt
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_errors_return_immediately() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), _> = RetryPolicy::default()
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(TestError::Fatal) }
                },
                |e| *e == TestError::Busy,
            )
            .await;

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
