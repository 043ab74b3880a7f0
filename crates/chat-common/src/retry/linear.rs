//! Linear backoff

use std::time::Duration;

use super::{RetryError, RetryPolicy};

/// Linear backoff: `min(base + attempt * increment, max)`, with
/// `increment = (max - base) / max_attempts`, so the last allowed attempt waits `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearRetry {
    base: Duration,
    max: Duration,
    max_attempts: u32,
}

impl LinearRetry {
    pub fn new(base: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max: max.max(base),
            max_attempts,
        }
    }

    fn increment(&self) -> Duration {
        if self.max_attempts == 0 {
            return Duration::ZERO;
        }
        (self.max - self.base) / self.max_attempts
    }
}

impl Default for LinearRetry {
    /// 2 s growing to 60 s over 10 attempts
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(60), 10)
    }
}

impl RetryPolicy for LinearRetry {
    fn next_delay(&self, attempt: u32) -> Result<Duration, RetryError> {
        if attempt > self.max_attempts {
            return Err(RetryError::Exhausted {
                attempts: self.max_attempts,
            });
        }
        let delay = self.base + self.increment() * attempt;
        Ok(delay.min(self.max))
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
