//! Request pacing for the RIDB fetchers
//!
//! Each fetcher owns its own pacing state. Nothing here is shared or global;
//! callers are expected to issue requests sequentially.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum gap between consecutive requests.
///
/// The gap is measured from the start of the previous request and applies
/// whatever that request's outcome was.
#[derive(Debug)]
pub struct PageThrottle {
    delay: Duration,
    last_request: Option<Instant>,
}

impl PageThrottle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: None,
        }
    }

    /// Time left to wait at `now` before the next request may start
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_request {
            Some(last) => (last + self.delay).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Wait out the remaining gap, then mark a request as started
    pub async fn wait(&mut self) {
        let remaining = self.remaining(Instant::now());
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
        self.last_request = Some(Instant::now());
    }
}

/// Crude fixed-window limiter: at most `max_calls` per `window`.
///
/// When a call would exceed the budget the caller sleeps until the window
/// ends, and that call opens the next window. A burst right after a reset is
/// allowed.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_calls: u32,
    window: Duration,
    calls: u32,
    window_start: Option<Instant>,
}

impl FixedWindowLimiter {
    pub fn new(max_calls: u32, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            calls: 0,
            window_start: None,
        }
    }

    /// Count a call made at `now` and return how long to sleep before making it
    pub fn register(&mut self, now: Instant) -> Option<Duration> {
        let start = *self.window_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);

        if elapsed >= self.window {
            self.window_start = Some(now);
            self.calls = 0;
        }

        self.calls += 1;
        if self.calls <= self.max_calls {
            return None;
        }

        let sleep_for = self.window.saturating_sub(elapsed);
        self.window_start = Some(now + sleep_for);
        self.calls = 1;
        Some(sleep_for)
    }

    /// Wait until a call is allowed
    pub async fn acquire(&mut self) {
        if let Some(sleep_for) = self.register(Instant::now()) {
            debug!(
                sleep_ms = sleep_for.as_millis() as u64,
                max_calls = self.max_calls,
                "Related-record rate limit reached"
            );
            tokio::time::sleep(sleep_for).await;
        }
    }

    /// Calls counted in the current window
    pub fn calls_in_window(&self) -> u32 {
        self.calls
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_first_request_is_not_delayed() {
        let throttle = PageThrottle::new(Duration::from_millis(1100));
        assert_eq!(throttle.remaining(Instant::now()), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_spaces_requests() {
        let mut throttle = PageThrottle::new(Duration::from_millis(1100));
        let start = Instant::now();

        throttle.wait().await;
        throttle.wait().await;
        throttle.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(2200));
        assert!(start.elapsed() < Duration::from_millis(2300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_counts_time_already_spent() {
        let mut throttle = PageThrottle::new(Duration::from_millis(1000));
        throttle.wait().await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(throttle.remaining(Instant::now()), Duration::from_millis(400));
    }

    #[test]
    fn test_limiter_allows_budget_then_sleeps_remainder() {
        let mut limiter = FixedWindowLimiter::new(3, Duration::from_secs(1));
        let t0 = Instant::now();

        assert_eq!(limiter.register(t0), None);
        assert_eq!(limiter.register(t0 + 100 * MS), None);
        assert_eq!(limiter.register(t0 + 200 * MS), None);
        assert_eq!(limiter.register(t0 + 300 * MS), Some(700 * MS));
        assert_eq!(limiter.calls_in_window(), 1);
    }

    #[test]
    fn test_limiter_resets_after_window() {
        let mut limiter = FixedWindowLimiter::new(2, Duration::from_secs(1));
        let t0 = Instant::now();

        assert_eq!(limiter.register(t0), None);
        assert_eq!(limiter.register(t0 + 10 * MS), None);
        // A slow batch never trips the limiter
        assert_eq!(limiter.register(t0 + 1000 * MS), None);
        assert_eq!(limiter.calls_in_window(), 1);
    }

    #[test]
    fn test_limiter_permits_burst_after_reset() {
        let mut limiter = FixedWindowLimiter::new(2, Duration::from_secs(1));
        let t0 = Instant::now();

        limiter.register(t0);
        limiter.register(t0);
        let sleep = limiter.register(t0).unwrap();
        assert_eq!(sleep, Duration::from_secs(1));

        // The delayed call opened a new window at t0 + 1s
        let resumed = t0 + sleep;
        assert_eq!(limiter.register(resumed), None);
        assert!(limiter.register(resumed + MS).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_sleeps_when_over_budget() {
        let mut limiter = FixedWindowLimiter::new(50, Duration::from_secs(1));
        let start = Instant::now();

        for _ in 0..50 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(10));

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
