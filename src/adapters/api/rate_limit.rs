//! Oracle Rate Limiter - Window Budget plus Request Spacing
//!
//! Gate in front of every outbound oracle call, shared by all polling
//! operations. Enforces two independent constraints:
//!
//! - at most `max_requests` calls per fixed `window` (default 60 per
//!   60 s), blocking until the window resets once the budget is
//!   exhausted;
//! - a minimum spacing between consecutive calls (default 1.1 s)
//!   regardless of remaining budget.
//!
//! Waits are bounded by the window length. Callers that must remain
//! cancellable wrap `acquire` in a `tokio::select!` with their
//! shutdown signal; dropping the future releases the gate.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Request budget per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
    /// Minimum spacing between consecutive requests.
    pub min_interval: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
            min_interval: Duration::from_millis(1100),
        }
    }
}

#[derive(Debug, Default)]
struct WindowState {
    /// Start of the current window; `None` before the first request.
    window_start: Option<Instant>,
    /// Requests issued in the current window.
    count: u32,
    /// Time of the last issued request.
    last_request: Option<Instant>,
}

/// Shared gate for outbound oracle calls.
///
/// The mutex is held across the waits on purpose: callers queue
/// behind it, which is exactly the blocking behavior the budget
/// requires.
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            state: Mutex::new(WindowState::default()),
        }
    }

    /// Block until a request slot is available, then consume it.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        loop {
            let now = Instant::now();

            // Roll the window if it has elapsed (or never started).
            match state.window_start {
                Some(start) if now.duration_since(start) >= self.config.window => {
                    state.window_start = Some(now);
                    state.count = 0;
                }
                None => {
                    state.window_start = Some(now);
                    state.count = 0;
                }
                Some(_) => {}
            }

            // Spacing constraint applies regardless of budget.
            if let Some(last) = state.last_request {
                let earliest = last + self.config.min_interval;
                if now < earliest {
                    sleep_until(earliest).await;
                    continue;
                }
            }

            // Window budget: wait out the remainder of the window.
            if state.count >= self.config.max_requests {
                let reset = state.window_start.expect("window started above")
                    + self.config.window;
                debug!(
                    wait_ms = reset.saturating_duration_since(now).as_millis(),
                    "Rate window exhausted, waiting for reset"
                );
                sleep_until(reset).await;
                continue;
            }

            state.count += 1;
            state.last_request = Some(now);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_ms: u64, min_interval_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_requests,
            window: Duration::from_millis(window_ms),
            min_interval: Duration::from_millis(min_interval_ms),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_requests_are_spaced() {
        let limiter = limiter(60, 60_000, 1_100);

        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }

        // 4 gaps of at least 1.1 s between 5 requests
        assert!(start.elapsed() >= Duration::from_millis(4 * 1_100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_budget_blocks_until_reset() {
        let limiter = limiter(3, 10_000, 1);

        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        let before_fourth = start.elapsed();
        assert!(before_fourth < Duration::from_secs(1));

        // Budget exhausted: the fourth call waits out the window.
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_never_exceeded_within_any_window() {
        let limiter = limiter(60, 60_000, 1_100);

        let start = Instant::now();
        let mut stamps = Vec::new();
        for _ in 0..70 {
            limiter.acquire().await;
            stamps.push(start.elapsed());
        }

        // Count calls inside every rolling 60 s span.
        for (i, t) in stamps.iter().enumerate() {
            let in_window = stamps[i..]
                .iter()
                .take_while(|s| **s - *t < Duration::from_secs(60))
                .count();
            assert!(in_window <= 60, "window starting at {t:?} holds {in_window}");
        }

        // And spacing held throughout.
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(1_100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_the_budget() {
        use std::sync::Arc;

        let limiter = Arc::new(limiter(4, 5_000, 1));
        let start = Instant::now();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let l = Arc::clone(&limiter);
                tokio::spawn(async move {
                    l.acquire().await;
                    start.elapsed()
                })
            })
            .collect();

        let mut stamps = Vec::new();
        for t in tasks {
            stamps.push(t.await.unwrap());
        }
        stamps.sort();

        // First four pass within the first window, the rest after it.
        assert!(stamps[3] < Duration::from_secs(5));
        assert!(stamps[4] >= Duration::from_secs(5));
    }
}
