//! Rate limiting primitives for authenticated endpoints.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Clone, Copy, Debug)]
pub enum RateLimitAction {
    ResolveStream,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

pub trait RateLimiter: Send + Sync {
    fn check_account(&self, account_id: Uuid, action: RateLimitAction) -> RateLimitDecision;
}

#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check_account(&self, _account_id: Uuid, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

/// In-process fixed window limiter: one request per account per window.
///
/// Stale entries are evicted on every check, so the map stays bounded by the
/// number of accounts active within a single window.
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    window: Duration,
    windows: Mutex<HashMap<Uuid, Instant>>,
}

impl FixedWindowRateLimiter {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn check(&self, account_id: Uuid, now: Instant) -> RateLimitDecision {
        let Ok(mut windows) = self.windows.lock() else {
            // Fail open on a poisoned lock.
            return RateLimitDecision::Allowed;
        };

        windows.retain(|_, started| now.duration_since(*started) < self.window);

        if windows.contains_key(&account_id) {
            RateLimitDecision::Limited
        } else {
            windows.insert(account_id, now);
            RateLimitDecision::Allowed
        }
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check_account(&self, account_id: Uuid, _action: RateLimitAction) -> RateLimitDecision {
        self.check(account_id, Instant::now())
    }
}
