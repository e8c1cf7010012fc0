//! Per-client request-rate ceiling.
//!
//! A reset-based window, not a true sliding log: the window restarts
//! wholesale once `reset_at` passes. Rejected calls do not increment the
//! counter, so an abusive client cannot grow it without bound inside one
//! window.

use std::time::Duration;

use dashmap::DashMap;
use metrics::counter;
use time::OffsetDateTime;

const METRIC_RATE_LIMIT_REJECTED_TOTAL: &str = "brezza_rate_limit_rejected_total";

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
}

#[derive(Debug, Clone)]
struct RateWindow {
    count: u32,
    reset_at: OffsetDateTime,
}

/// Reset-window rate limiter keyed by client identifier.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: DashMap<String, RateWindow>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: DashMap::new(),
        }
    }

    /// Check a request against the configured ceiling.
    pub fn check(&self, client_id: &str) -> RateDecision {
        self.check_with(client_id, self.max_requests, self.window)
    }

    /// Check a request against an explicit ceiling and window.
    ///
    /// A first request, or one after `reset_at`, starts a fresh window with
    /// count 1. Otherwise the request is allowed iff the window still has
    /// room, and only allowed requests count.
    pub fn check_with(&self, client_id: &str, limit: u32, window: Duration) -> RateDecision {
        let now = OffsetDateTime::now_utc();
        let mut entry = self
            .buckets
            .entry(client_id.to_string())
            .or_insert_with(|| RateWindow {
                count: 0,
                reset_at: now + window,
            });

        if now >= entry.reset_at {
            // Window elapsed: replaced wholesale.
            *entry = RateWindow {
                count: 0,
                reset_at: now + window,
            };
        }

        if entry.count < limit {
            entry.count += 1;
            RateDecision {
                allowed: true,
                remaining: limit - entry.count,
            }
        } else {
            counter!(METRIC_RATE_LIMIT_REJECTED_TOTAL).increment(1);
            RateDecision {
                allowed: false,
                remaining: 0,
            }
        }
    }

    /// Number of client identifiers currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 3);

        assert!(limiter.check("client-a").allowed);
        assert!(limiter.check("client-a").allowed);
        let third = limiter.check("client-a");
        assert!(third.allowed);
        assert_eq!(third.remaining, 0);

        assert!(!limiter.check("client-a").allowed);
    }

    #[test]
    fn rejections_do_not_consume_the_window() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);

        limiter.check("client-a");
        limiter.check("client-a");
        // A burst of rejected calls must not inflate the counter.
        for _ in 0..50 {
            assert!(!limiter.check("client-a").allowed);
        }
    }

    #[test]
    fn window_restarts_after_reset() {
        let limiter = RateLimiter::new(Duration::from_millis(30), 3);

        for _ in 0..3 {
            assert!(limiter.check("client-a").allowed);
        }
        assert!(!limiter.check("client-a").allowed);

        std::thread::sleep(Duration::from_millis(50));
        let fresh = limiter.check("client-a");
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 2);
    }

    #[test]
    fn clients_are_isolated() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);

        assert!(limiter.check("client-a").allowed);
        assert!(!limiter.check("client-a").allowed);
        assert!(limiter.check("client-b").allowed);
        assert_eq!(limiter.tracked_clients(), 2);
    }
}
