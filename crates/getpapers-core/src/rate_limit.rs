//! Rolling-window rate limiter shared by all request workers.
//!
//! At most `calls` grants fall inside any window of length `period`.
//! Each caller reserves the earliest admissible slot while holding the lock,
//! then sleeps outside it, so waiters are served in lock order.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Blocking limiter: `acquire` delays, it never fails.
#[derive(Debug)]
pub struct RateLimiter {
    calls: usize,
    period: Duration,
    /// The last `calls` granted slots, oldest first
    granted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Allow `calls` acquisitions per rolling `period`.
    ///
    /// `calls == 0` is treated as 1.
    pub fn new(calls: usize, period: Duration) -> Self {
        let calls = calls.max(1);
        log::debug!("Rate limiter: {calls} calls per {period:?}");
        Self {
            calls,
            period,
            granted: Mutex::new(VecDeque::with_capacity(calls)),
        }
    }

    /// Limiter that never delays.
    pub fn unlimited() -> Self {
        Self {
            calls: usize::MAX,
            period: Duration::ZERO,
            granted: Mutex::new(VecDeque::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Block until this caller may proceed.
    pub fn acquire(&self) {
        let wait = self.reserve(Instant::now());
        if !wait.is_zero() {
            log::trace!("Rate limited: waiting {wait:?}");
            std::thread::sleep(wait);
        }
    }

    /// Reserve the next slot at or after `now`, returning how long to wait for it.
    fn reserve(&self, now: Instant) -> Duration {
        if self.period.is_zero() {
            return Duration::ZERO;
        }

        // A panic elsewhere cannot leave the deque inconsistent
        let mut granted = self.granted.lock().unwrap_or_else(PoisonError::into_inner);

        let slot = if granted.len() < self.calls {
            now
        } else {
            granted
                .front()
                .map_or(now, |&oldest| (oldest + self.period).max(now))
        };

        granted.push_back(slot);
        while granted.len() > self.calls {
            granted.pop_front();
        }

        slot.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_k_calls_are_immediate() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        let now = Instant::now();
        assert_eq!(limiter.reserve(now), Duration::ZERO);
        assert_eq!(limiter.reserve(now), Duration::ZERO);
        assert_eq!(limiter.reserve(now), Duration::ZERO);
    }

    #[test]
    fn fourth_call_waits_one_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        let now = Instant::now();
        for _ in 0..3 {
            limiter.reserve(now);
        }
        assert_eq!(limiter.reserve(now), Duration::from_secs(1));
        assert_eq!(limiter.reserve(now), Duration::from_secs(1));
        assert_eq!(limiter.reserve(now), Duration::from_secs(1));
        assert_eq!(limiter.reserve(now), Duration::from_secs(2));
    }

    #[test]
    fn window_slides_with_time() {
        let limiter = RateLimiter::new(2, Duration::from_millis(100));
        let t0 = Instant::now();
        limiter.reserve(t0);
        limiter.reserve(t0 + Duration::from_millis(50));
        // Oldest grant expires at t0+100
        let wait = limiter.reserve(t0 + Duration::from_millis(80));
        assert_eq!(wait, Duration::from_millis(20));
        // After a long pause, no waiting at all
        let wait = limiter.reserve(t0 + Duration::from_secs(5));
        assert_eq!(wait, Duration::ZERO);
    }

    #[test]
    fn zero_calls_treated_as_one() {
        let limiter = RateLimiter::new(0, Duration::from_millis(10));
        assert_eq!(limiter.calls(), 1);
    }

    #[test]
    fn unlimited_never_waits() {
        let limiter = RateLimiter::unlimited();
        let now = Instant::now();
        for _ in 0..100 {
            assert_eq!(limiter.reserve(now), Duration::ZERO);
        }
    }

    #[test]
    fn concurrent_callers_respect_window() {
        let period = Duration::from_millis(300);
        let limiter = Arc::new(RateLimiter::new(3, period));
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let start = Instant::now();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let limiter = limiter.clone();
                let stamps = stamps.clone();
                std::thread::spawn(move || {
                    limiter.acquire();
                    stamps.lock().unwrap().push(Instant::now());
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // 10 calls at 3 per window: grants in windows 0, 1, 2 and 3
        assert!(start.elapsed() >= period * 3);

        let mut stamps = stamps.lock().unwrap().clone();
        stamps.sort();
        assert_eq!(stamps.len(), 10);
        // No 4 grants inside one window (small slack for scheduler jitter)
        let slack = Duration::from_millis(30);
        for pair in stamps.windows(4) {
            assert!(pair[3].duration_since(pair[0]) + slack >= period);
        }
    }
}
