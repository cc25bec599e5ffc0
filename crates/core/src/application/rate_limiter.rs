//! Per-source Token Bucket
//!
//! Each source owns an independent bucket, so concurrent adapters never
//! contend with each other. Uses atomic operations to avoid lock contention
//! between the fetch loop and any other caller sharing the bucket.

use crate::domain::RateLimitConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Fixed-point scale: one token = 1000 milli-tokens
const MILLI: u64 = 1000;

/// Largest capacity representable in the packed state
const MAX_CAPACITY: u32 = u32::MAX / MILLI as u32;

/// No token became available within the allowed wait
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rate limit: no token within {waited_ms}ms")]
pub struct Throttled {
    pub waited_ms: u64,
}

/// Token bucket: `capacity` tokens, refilled at `requests` per `interval`
pub struct TokenBucket {
    // Upper 32 bits: milli-tokens
    // Lower 32 bits: last refill (ms since creation, wrapping)
    packed: AtomicU64,
    creation_time: Instant,
    capacity: u32,
    requests: u32,
    interval_ms: u64,
}

impl TokenBucket {
    /// Create a full bucket
    ///
    /// # Arguments
    /// * `capacity` - Maximum burst size
    /// * `requests` - Tokens added per `interval`
    /// * `interval` - Refill period
    pub fn new(capacity: u32, requests: u32, interval: Duration) -> Self {
        let capacity = capacity.clamp(1, MAX_CAPACITY);
        Self {
            packed: AtomicU64::new(pack(capacity as u64 * MILLI, 0)),
            creation_time: Instant::now(),
            capacity,
            requests: requests.max(1),
            interval_ms: (interval.as_millis() as u64).max(1),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.capacity(),
            config.requests,
            Duration::from_millis(config.interval_ms),
        )
    }

    fn elapsed_ms(&self) -> u32 {
        // Truncation wraps after ~49 days; deltas are computed with wrapping_sub
        Instant::now().duration_since(self.creation_time).as_millis() as u32
    }

    fn refilled(&self, milli_tokens: u64, last_refill_ms: u32, now_ms: u32) -> u64 {
        let capacity = self.capacity as u64 * MILLI;
        let delta_ms = now_ms.wrapping_sub(last_refill_ms) as u128;
        // u128: a long idle period times a large `requests` overflows u64
        let added = delta_ms * self.requests as u128 * MILLI as u128 / self.interval_ms as u128;
        let added = u64::try_from(added).unwrap_or(u64::MAX);
        milli_tokens.saturating_add(added).min(capacity)
    }

    /// Consume one token if available (never waits)
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_or_deficit().is_ok()
    }

    /// On failure returns the milli-tokens still missing
    fn try_acquire_or_deficit(&self) -> Result<(), u64> {
        loop {
            let packed = self.packed.load(Ordering::Acquire);
            let (milli_tokens, last_refill_ms) = unpack(packed);
            let now_ms = self.elapsed_ms();
            let available = self.refilled(milli_tokens, last_refill_ms, now_ms);

            if available >= MILLI {
                let new_packed = pack(available - MILLI, now_ms);
                match self.packed.compare_exchange(
                    packed,
                    new_packed,
                    Ordering::Release,
                    Ordering::Acquire,
                ) {
                    Ok(_) => return Ok(()),
                    Err(_) => continue,
                }
            } else {
                // Persist the refill so fractional progress is not lost
                let _ = self.packed.compare_exchange(
                    packed,
                    pack(available, now_ms),
                    Ordering::Release,
                    Ordering::Acquire,
                );
                return Err(MILLI - available);
            }
        }
    }

    /// Wait for a token for at most `max_wait`
    pub async fn acquire(&self, max_wait: Duration) -> Result<(), Throttled> {
        let started = Instant::now();
        let deadline = started + max_wait;

        loop {
            let deficit = match self.try_acquire_or_deficit() {
                Ok(()) => return Ok(()),
                Err(deficit) => deficit,
            };

            let now = Instant::now();
            if now >= deadline {
                return Err(Throttled {
                    waited_ms: now.duration_since(started).as_millis() as u64,
                });
            }

            // Time until the missing fraction refills, rounded up
            let per_token_ms = self.interval_ms as f64 / self.requests as f64;
            let wait_ms = ((deficit as f64 / MILLI as f64) * per_token_ms).ceil().max(1.0) as u64;
            let wake = (now + Duration::from_millis(wait_ms)).min(deadline);
            tokio::time::sleep_until(wake).await;
        }
    }

    /// Whole tokens currently available (for logging)
    pub fn available(&self) -> u32 {
        let (milli_tokens, last_refill_ms) = unpack(self.packed.load(Ordering::Acquire));
        (self.refilled(milli_tokens, last_refill_ms, self.elapsed_ms()) / MILLI) as u32
    }
}

fn pack(milli_tokens: u64, last_refill_ms: u32) -> u64 {
    (milli_tokens << 32) | last_refill_ms as u64
}

fn unpack(packed: u64) -> (u64, u32) {
    (packed >> 32, (packed & 0xFFFF_FFFF) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_allows_burst_then_denies() {
        let bucket = TokenBucket::new(3, 1, Duration::from_secs(1));

        for _ in 0..3 {
            assert!(bucket.try_acquire());
        }
        assert!(!bucket.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refills_over_time() {
        let bucket = TokenBucket::new(2, 2, Duration::from_secs(1));
        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(bucket.available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_refill() {
        let bucket = TokenBucket::new(1, 1, Duration::from_secs(2));
        assert!(bucket.try_acquire());

        let started = Instant::now();
        bucket.acquire(Duration::from_secs(5)).await.unwrap();
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(2), "waited {waited:?}");
        assert!(waited < Duration::from_secs(3), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_times_out() {
        let bucket = TokenBucket::new(1, 1, Duration::from_secs(60));
        assert!(bucket.try_acquire());

        let err = bucket.acquire(Duration::from_millis(100)).await.unwrap_err();
        assert!(err.waited_ms >= 100);
    }

    #[tokio::test]
    async fn test_concurrent_acquires_respect_capacity() {
        let bucket = Arc::new(TokenBucket::new(50, 1, Duration::from_secs(3600)));

        let mut handles = vec![];
        for _ in 0..10 {
            let bucket = Arc::clone(&bucket);
            handles.push(tokio::spawn(async move {
                (0..20).filter(|_| bucket.try_acquire()).count()
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }
        assert_eq!(total, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_saturates_after_long_idle() {
        let bucket = TokenBucket::new(MAX_CAPACITY, u32::MAX, Duration::from_millis(1));
        let full = MAX_CAPACITY as u64 * MILLI;

        assert_eq!(bucket.refilled(0, 0, u32::MAX), full);
        assert_eq!(bucket.refilled(full - 1, 0, u32::MAX), full);
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_config_uses_burst() {
        let config = RateLimitConfig {
            requests: 2,
            interval_ms: 1000,
            burst: Some(5),
            acquire_timeout_ms: 100,
        };
        let bucket = TokenBucket::from_config(&config);
        assert_eq!(bucket.available(), 5);
    }
}
