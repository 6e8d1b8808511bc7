//! Politeness rate limiter
//!
//! One shared stopwatch per crawl run: every outbound request goes through
//! `wait`, which sleeps until at least the configured delay has elapsed
//! since the previous request, then restamps the clock.

use std::time::Duration;
use tokio::time::Instant;

/// Enforces the minimum delay between consecutive outbound requests
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    /// Creates a rate limiter with the given delay
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: None,
        }
    }

    /// Creates a rate limiter from a delay in seconds
    ///
    /// The value must be finite and non-negative; config validation
    /// guarantees this before a run starts.
    pub fn from_secs_f64(delay_seconds: f64) -> Self {
        Self::new(Duration::from_secs_f64(delay_seconds))
    }

    /// Blocks until the delay since the previous request has elapsed
    ///
    /// The first call never sleeps. A zero delay never sleeps.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                tokio::time::sleep(self.delay - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// The configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_wait_does_not_sleep() {
        let mut limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();

        limiter.wait().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_waits_enforce_delay() {
        let mut limiter = RateLimiter::new(Duration::from_millis(500));
        let start = Instant::now();

        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;

        // Two gated waits after the free first one
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_counts_toward_delay() {
        let mut limiter = RateLimiter::new(Duration::from_millis(500));

        limiter.wait().await;
        tokio::time::sleep(Duration::from_millis(400)).await;

        let before = Instant::now();
        limiter.wait().await;

        // Only the remaining 100ms should be slept
        assert_eq!(before.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_never_sleeps() {
        let mut limiter = RateLimiter::new(Duration::ZERO);
        let start = Instant::now();

        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
