//! Retry policy for acknowledged sends.

use std::time::Duration;

/// Bounded retry with a fixed delay between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
    /// How long one attempt waits for its acknowledgment.
    pub ack_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration, ack_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            ack_timeout,
        }
    }

    /// Single attempt, no waiting between tries.
    pub fn no_retry(ack_timeout: Duration) -> Self {
        Self::new(1, Duration::ZERO, ack_timeout)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(200),
            ack_timeout: Duration::from_secs(1),
        }
    }
}
