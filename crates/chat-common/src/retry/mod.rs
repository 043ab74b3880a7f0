//! Retry policies for reconnects and transient REST failures

mod linear;

pub use linear::LinearRetry;

use std::time::Duration;

/// Produces the delay before a retry attempt.
///
/// `attempt` counts the failures so far, starting at 0 for the first retry. Policies are
/// stateless; callers own the counter and reset it after a success.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Delay before retry number `attempt`
    ///
    /// # Errors
    /// Returns [`RetryError::Exhausted`] once the policy allows no further attempts.
    fn next_delay(&self, attempt: u32) -> Result<Duration, RetryError>;

    /// Largest attempt number that still yields a delay
    fn max_attempts(&self) -> u32;
}

/// Retry policy errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    #[error("retry attempts exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },
}
