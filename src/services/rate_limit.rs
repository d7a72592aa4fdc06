//! Fixed-window rate limiting for the two draft-core write buckets.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Player actions per window, keyed `${sessionId}:${playerTokenOrAddress}`.
const ACTION_LIMIT: u32 = 20;
const ACTION_WINDOW: Duration = Duration::from_secs(10);
/// Owner mutations per window (session create/update/delete, preset CRUD).
const OWNER_LIMIT: u32 = 30;
const OWNER_WINDOW: Duration = Duration::from_secs(60);

/// Buckets are pruned once the map grows past this many keys.
const PRUNE_THRESHOLD: usize = 4096;

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter keyed by an opaque string.
pub struct RateLimiter {
    buckets: DashMap<String, Window>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            buckets: DashMap::new(),
            limit,
            window,
        }
    }

    /// Bucket guarding `POST /sessions/{key}/actions`.
    pub fn player_actions() -> Self {
        Self::new(ACTION_LIMIT, ACTION_WINDOW)
    }

    /// Bucket guarding owner-authenticated mutations.
    pub fn owner_mutations() -> Self {
        Self::new(OWNER_LIMIT, OWNER_WINDOW)
    }

    /// Record one hit for `key`; `false` means the caller is over budget.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        if self.buckets.len() > PRUNE_THRESHOLD {
            let window = self.window;
            self.buckets
                .retain(|_, entry| now.duration_since(entry.started) < window);
        }

        let mut entry = self.buckets.entry(key.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }
        if entry.count >= self.limit {
            return false;
        }
        entry.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_the_limit_within_a_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.check_at("k", start));
        assert!(limiter.check_at("k", start));
        assert!(limiter.check_at("k", start));
        assert!(!limiter.check_at("k", start));
    }

    #[test]
    fn window_expiry_resets_the_budget() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.check_at("k", start));
        assert!(!limiter.check_at("k", start + Duration::from_secs(9)));
        assert!(limiter.check_at("k", start + Duration::from_secs(10)));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.check_at("s1:alice", start));
        assert!(limiter.check_at("s1:bob", start));
        assert!(!limiter.check_at("s1:alice", start));
    }
}
