//! Sliding-log rate limiter.
//!
//! Each key holds the timestamps of its requests inside the current window.
//! A request is allowed when, after pruning timestamps older than the
//! window, fewer than `limit` remain. Retry-after is computed from the
//! oldest surviving timestamp, so it shrinks monotonically as the window
//! slides.
//!
//! Sharded across several mutex-protected maps to reduce lock contention;
//! keys are hashed to pick a shard.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

const DEFAULT_SHARD_COUNT: usize = 16;

/// Maximum keys per shard before pruning and eviction kick in.
const MAX_KEYS_PER_SHARD: usize = 10_000;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Seconds until the oldest in-window request ages out. Zero when
    /// allowed.
    pub retry_after_seconds: u64,
    /// Requests left in the window after this one.
    pub remaining: u32,
}

#[derive(Clone)]
pub struct RateLimiter {
    shards: Vec<Arc<Mutex<HashMap<String, Vec<Instant>>>>>,
    shard_count: usize,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARD_COUNT)
    }

    pub fn with_shards(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            shard_count,
        }
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shard_count
    }

    /// Record an attempt for `key` and decide whether it is allowed.
    pub async fn check(&self, key: &str, limit: u32, window: Duration) -> RateLimitDecision {
        self.check_at(key, limit, window, Instant::now()).await
    }

    async fn check_at(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: Instant,
    ) -> RateLimitDecision {
        let shard = &self.shards[self.shard_index(key)];
        let mut log = shard.lock().await;

        if log.len() >= MAX_KEYS_PER_SHARD && !log.contains_key(key) {
            Self::evict(&mut log, window, now);
        }

        let timestamps = log.entry(key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < window);

        if (timestamps.len() as u32) < limit {
            timestamps.push(now);
            RateLimitDecision {
                allowed: true,
                retry_after_seconds: 0,
                remaining: limit - timestamps.len() as u32,
            }
        } else {
            // Oldest timestamp is first: retain preserves insertion order.
            let oldest = timestamps[0];
            let elapsed = now.duration_since(oldest);
            let wait = window.saturating_sub(elapsed);
            RateLimitDecision {
                allowed: false,
                retry_after_seconds: wait.as_secs_f64().ceil() as u64,
                remaining: 0,
            }
        }
    }

    /// Drop keys whose entire log has aged out; if the shard is still full,
    /// evict the key with the oldest most-recent request.
    fn evict(log: &mut HashMap<String, Vec<Instant>>, window: Duration, now: Instant) {
        log.retain(|_, timestamps| {
            timestamps
                .last()
                .is_some_and(|t| now.duration_since(*t) < window)
        });

        if log.len() >= MAX_KEYS_PER_SHARD {
            let stalest = log
                .iter()
                .min_by_key(|(_, timestamps)| timestamps.last().copied())
                .map(|(k, _)| k.clone());
            if let Some(key) = stalest {
                log.remove(&key);
                tracing::debug!(evicted_key = %key, "Evicted stalest rate limit entry at capacity");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn sixth_request_is_rejected_at_limit_five() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for i in 0..5 {
            let decision = limiter.check_at("ip:1.2.3.4", 5, WINDOW, start).await;
            assert!(decision.allowed, "request {} should pass", i + 1);
            assert_eq!(decision.remaining, 4 - i);
        }

        let decision = limiter.check_at("ip:1.2.3.4", 5, WINDOW, start).await;
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_seconds, 60);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn retry_after_shrinks_as_the_window_slides() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for _ in 0..3 {
            limiter.check_at("k", 3, WINDOW, start).await;
        }

        let at_20 = limiter
            .check_at("k", 3, WINDOW, start + Duration::from_secs(20))
            .await;
        let at_45 = limiter
            .check_at("k", 3, WINDOW, start + Duration::from_secs(45))
            .await;

        assert!(!at_20.allowed);
        assert!(!at_45.allowed);
        assert_eq!(at_20.retry_after_seconds, 40);
        assert_eq!(at_45.retry_after_seconds, 15);
    }

    #[tokio::test]
    async fn requests_age_out_after_the_window() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for _ in 0..2 {
            limiter.check_at("k", 2, WINDOW, start).await;
        }
        assert!(!limiter.check_at("k", 2, WINDOW, start).await.allowed);

        let later = start + WINDOW + Duration::from_secs(1);
        let decision = limiter.check_at("k", 2, WINDOW, later).await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }

    #[tokio::test]
    async fn keys_are_limited_independently() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        limiter.check_at("parse:a", 1, WINDOW, start).await;
        assert!(!limiter.check_at("parse:a", 1, WINDOW, start).await.allowed);
        assert!(limiter.check_at("parse:b", 1, WINDOW, start).await.allowed);
        assert!(limiter.check_at("ocr:a", 1, WINDOW, start).await.allowed);
    }

    #[tokio::test]
    async fn partial_refill_allows_only_freed_slots() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        limiter.check_at("k", 2, WINDOW, start).await;
        limiter
            .check_at("k", 2, WINDOW, start + Duration::from_secs(30))
            .await;

        // 61s in: only the first timestamp has aged out.
        let later = start + Duration::from_secs(61);
        assert!(limiter.check_at("k", 2, WINDOW, later).await.allowed);
        let decision = limiter.check_at("k", 2, WINDOW, later).await;
        assert!(!decision.allowed);
        // Oldest surviving entry is 31s old, so 29s remain.
        assert_eq!(decision.retry_after_seconds, 29);
    }
}
