//! Bucket accounting
//!
//! A bucket is either fixed-window (configured locally: `capacity` admissions per `window`)
//! or server-driven (created on first use, counters supplied by responses). A server-driven
//! bucket with no known counters admits one request at a time until a response reports them.

use tokio::time::{Duration, Instant};

/// Why an admission attempt has to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wait {
    /// Capacity returns at this instant
    Until(Instant),
    /// Capacity returns when an in-flight permit is released or counters are reported
    Release,
}

#[derive(Debug, Clone)]
pub(crate) struct BucketState {
    pub(crate) capacity: u32,
    pub(crate) window: Option<Duration>,
    pub(crate) remaining: u32,
    pub(crate) reset_at: Option<Instant>,
    pub(crate) in_flight: u32,
}

impl BucketState {
    /// Server-driven bucket with unknown counters
    pub(crate) fn unknown() -> Self {
        Self {
            capacity: 1,
            window: None,
            remaining: 0,
            reset_at: None,
            in_flight: 0,
        }
    }

    pub(crate) fn fixed(capacity: u32, window: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            window: Some(window),
            remaining: capacity,
            reset_at: None,
            in_flight: 0,
        }
    }

    fn roll_over(&mut self, now: Instant) {
        let Some(reset_at) = self.reset_at else {
            return;
        };
        if now < reset_at {
            return;
        }
        self.reset_at = None;
        self.remaining = match self.window {
            Some(_) => self.capacity,
            // Counters are unknown again until the next response
            None => 0,
        };
    }

    /// Admit one request at `now`, or report how long to wait.
    pub(crate) fn try_admit(&mut self, now: Instant) -> Result<(), Wait> {
        self.roll_over(now);

        if self.reset_at.is_none() && self.window.is_none() {
            // Unknown server-driven bucket: one request at a time until headers arrive
            if self.in_flight < self.capacity {
                self.in_flight += 1;
                return Ok(());
            }
            return Err(Wait::Release);
        }

        if self.remaining == 0 {
            return Err(self.reset_at.map_or(Wait::Release, Wait::Until));
        }
        if self.window.is_some() && self.in_flight >= self.capacity {
            return Err(Wait::Release);
        }

        self.remaining -= 1;
        self.in_flight += 1;
        if let (None, Some(window)) = (self.reset_at, self.window) {
            self.reset_at = Some(now + window);
        }
        Ok(())
    }

    pub(crate) fn release(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub(crate) fn update(&mut self, remaining: u32, reset_at: Instant) {
        self.remaining = remaining;
        self.reset_at = Some(reset_at);
    }

    pub(crate) fn exhaust_until(&mut self, until: Instant) {
        self.remaining = 0;
        self.reset_at = Some(until);
    }
}

/// Point-in-time view of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSnapshot {
    pub remaining: u32,
    pub reset_at: Option<Instant>,
    pub in_flight: u32,
}

impl From<&BucketState> for BucketSnapshot {
    fn from(state: &BucketState) -> Self {
        Self {
            remaining: state.remaining,
            reset_at: state.reset_at,
            in_flight: state.in_flight,
        }
    }
}
