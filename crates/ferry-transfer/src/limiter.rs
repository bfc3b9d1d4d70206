//! Byte-rate throttling using a token bucket.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Token-bucket limiter shared by all workers of one transfer job.
///
/// Permits are bytes. The bucket holds at most one second of budget, so a
/// burst never exceeds the configured rate by more than that. Acquiring
/// more than the capacity in one call is allowed; the bucket goes into
/// debt and later acquirers pay it off by waiting.
pub struct RateLimiter {
    bucket: Option<Mutex<Bucket>>,
}

struct Bucket {
    tokens: f64,
    rate: f64,
    capacity: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Limit to `bytes_per_sec`. Zero means unlimited.
    pub fn new(bytes_per_sec: u64) -> Self {
        if bytes_per_sec == 0 {
            return Self::unlimited();
        }
        let rate = bytes_per_sec as f64;
        Self {
            bucket: Some(Mutex::new(Bucket {
                tokens: rate,
                rate,
                capacity: rate,
                last_refill: Instant::now(),
            })),
        }
    }

    /// A limiter that never blocks.
    pub fn unlimited() -> Self {
        Self { bucket: None }
    }

    pub fn from_limit(bytes_per_sec: Option<u64>) -> Self {
        match bytes_per_sec {
            Some(rate) => Self::new(rate),
            None => Self::unlimited(),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.bucket.is_none()
    }

    /// Take `n` byte-permits, sleeping until the bucket can cover them.
    pub async fn acquire(&self, n: u64) {
        let Some(bucket) = &self.bucket else {
            return;
        };
        if n == 0 {
            return;
        }
        let wait = {
            let mut b = bucket.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let now = Instant::now();
            let elapsed = now.duration_since(b.last_refill).as_secs_f64();
            b.tokens = (b.tokens + elapsed * b.rate).min(b.capacity);
            b.last_refill = now;
            b.tokens -= n as f64;
            if b.tokens >= 0.0 {
                None
            } else {
                Some(Duration::from_secs_f64(-b.tokens / b.rate))
            }
        };
        if let Some(wait) = wait {
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unlimited_never_blocks() {
        let limiter = RateLimiter::unlimited();
        assert!(limiter.is_unlimited());
        limiter.acquire(u64::MAX / 2).await;

        let zero = RateLimiter::new(0);
        assert!(zero.is_unlimited());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_takes_at_least_bytes_over_rate() {
        // 1 KiB/s cap, 10 KiB of traffic: at least 9 seconds after the
        // initial one-second burst allowance.
        let limiter = RateLimiter::new(1024);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire(1024).await;
        }
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_secs(9),
            "elapsed only {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_capacity_is_free() {
        let limiter = RateLimiter::new(8192);
        let start = Instant::now();
        limiter.acquire(4096).await;
        limiter.acquire(4096).await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_acquire_goes_into_debt() {
        let limiter = RateLimiter::new(1000);
        // 5 seconds of budget in one call: 1s is banked, 4s of debt.
        let start = Instant::now();
        limiter.acquire(5000).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4), "elapsed only {elapsed:?}");
        assert!(elapsed < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_across_tasks() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(1024));
        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire(1024).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        // 4 KiB across four tasks at 1 KiB/s: roughly three seconds after
        // the shared burst.
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
