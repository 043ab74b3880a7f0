//! Keyed rate limiter
//!
//! Buckets are created lazily on first use and live as long as the limiter. Each bucket has
//! its own locks, so unrelated keys never contend. Waiters on one bucket queue on a fair
//! mutex and are admitted in FIFO order.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Notify;
use tokio::time::{sleep_until, Duration, Instant};

use super::bucket::{BucketSnapshot, BucketState, Wait};

struct Bucket {
    key: String,
    /// Held by the caller currently waiting for admission
    turnstile: tokio::sync::Mutex<()>,
    state: parking_lot::Mutex<BucketState>,
    changed: Notify,
}

impl Bucket {
    fn new(key: &str, state: BucketState) -> Self {
        Self {
            key: key.to_string(),
            turnstile: tokio::sync::Mutex::new(()),
            state: parking_lot::Mutex::new(state),
            changed: Notify::new(),
        }
    }
}

/// Shared, per-key admission control
#[derive(Clone, Default)]
pub struct RateLimiter {
    buckets: Arc<DashMap<String, Arc<Bucket>>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("buckets", &self.buckets.len())
            .finish()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket(&self, key: &str) -> Arc<Bucket> {
        if let Some(bucket) = self.buckets.get(key) {
            return Arc::clone(&bucket);
        }
        Arc::clone(
            &self
                .buckets
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Bucket::new(key, BucketState::unknown()))),
        )
    }

    /// Make `key` a fixed-window bucket admitting `capacity` requests per `window`.
    pub fn configure(&self, key: &str, capacity: u32, window: Duration) {
        let bucket = self.bucket(key);
        *bucket.state.lock() = BucketState::fixed(capacity, window);
        bucket.changed.notify_one();
    }

    /// Wait until `key` has capacity, then take one unit of it.
    ///
    /// The returned permit counts as in flight until dropped.
    pub async fn acquire(&self, key: &str) -> Permit {
        let bucket = self.bucket(key);
        let _turn = bucket.turnstile.lock().await;

        loop {
            let admitted = bucket.state.lock().try_admit(Instant::now());
            match admitted {
                Ok(()) => break,
                Err(Wait::Until(deadline)) => {
                    tracing::debug!(bucket = %bucket.key, wait_ms = %deadline.saturating_duration_since(Instant::now()).as_millis(), "Rate limited, waiting for reset");
                    tokio::select! {
                        () = sleep_until(deadline) => {}
                        () = bucket.changed.notified() => {}
                    }
                }
                Err(Wait::Release) => bucket.changed.notified().await,
            }
        }

        Permit {
            bucket: Arc::clone(&bucket),
        }
    }

    /// Reconcile `key` with counters reported by the server. Server values replace local ones.
    pub fn update_from_response(&self, key: &str, remaining: u32, reset_at: Instant) {
        let bucket = self.bucket(key);
        bucket.state.lock().update(remaining, reset_at);
        tracing::trace!(bucket = %key, remaining, "Bucket updated from response");
        bucket.changed.notify_one();
    }

    /// Force `key` to zero remaining until `now + retry_after`.
    pub fn apply_retry_after(&self, key: &str, retry_after: Duration) {
        let bucket = self.bucket(key);
        bucket
            .state
            .lock()
            .exhaust_until(Instant::now() + retry_after);
        tracing::debug!(bucket = %key, retry_after_ms = %retry_after.as_millis(), "Bucket exhausted by retry-after");
        bucket.changed.notify_one();
    }

    /// Current counters of `key`, if the bucket exists
    pub fn snapshot(&self, key: &str) -> Option<BucketSnapshot> {
        self.buckets
            .get(key)
            .map(|bucket| BucketSnapshot::from(&*bucket.state.lock()))
    }
}

/// Admission to a bucket; releases its in-flight slot on drop
pub struct Permit {
    bucket: Arc<Bucket>,
}

impl Permit {
    pub fn key(&self) -> &str {
        &self.bucket.key
    }
}

impl std::fmt::Debug for Permit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Permit").field("key", &self.bucket.key).finish()
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.bucket.state.lock().release();
        self.bucket.changed.notify_one();
    }
}
