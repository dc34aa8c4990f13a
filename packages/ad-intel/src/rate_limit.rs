//! Call-rate control for hosted model calls.
//!
//! [`CallWindow`] is a strict rolling window (N calls per trailing period),
//! shared by every caller of the classifier. [`Pacer`] spaces calls evenly
//! and is used by the tagger between records.

use governor::{Quota, RateLimiter};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Allows at most `max_calls` acquisitions in any trailing `window`.
///
/// Clone shares the same window.
#[derive(Debug, Clone)]
pub struct CallWindow {
    max_calls: usize,
    window: Duration,
    calls: Arc<Mutex<VecDeque<Instant>>>,
}

impl CallWindow {
    /// A zero `max_calls` is treated as one.
    pub fn new(max_calls: usize, window: Duration) -> Self {
        let max_calls = max_calls.max(1);
        Self {
            max_calls,
            window,
            calls: Arc::new(Mutex::new(VecDeque::with_capacity(max_calls))),
        }
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait for a free slot and record a call.
    pub async fn acquire(&self) {
        loop {
            let wait_until = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                evict_expired(&mut calls, now, self.window);

                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return;
                }

                // Full: the oldest call is the next to leave the window
                match calls.front() {
                    Some(oldest) => *oldest + self.window,
                    None => now,
                }
            };

            debug!(
                max_calls = self.max_calls,
                window_secs = self.window.as_secs_f64(),
                "Call window full, waiting"
            );
            tokio::time::sleep_until(wait_until).await;
        }
    }

    /// Calls currently counted against the window.
    pub async fn in_flight_window(&self) -> usize {
        let mut calls = self.calls.lock().await;
        evict_expired(&mut calls, Instant::now(), self.window);
        calls.len()
    }
}

fn evict_expired(calls: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = calls.front() {
        if now.duration_since(*oldest) >= window {
            calls.pop_front();
        } else {
            break;
        }
    }
}

/// Fixed spacing between successive calls.
#[derive(Clone)]
pub struct Pacer {
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl Pacer {
    /// A zero interval disables pacing.
    pub fn new(interval: Duration) -> Self {
        let limiter = Quota::with_period(interval).map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self { limiter }
    }

    pub fn disabled() -> Self {
        Self { limiter: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
