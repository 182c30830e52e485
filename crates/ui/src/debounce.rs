//! Poll-style debouncing.

use std::time::{Duration, Instant};

/// Text filter debounce delay.
pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

/// Holds the latest value until it has been quiet for `wait`.
#[derive(Debug)]
pub struct Debouncer<T> {
    wait: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    /// Replace the pending value and restart the wait.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.wait));
    }

    /// Take the pending value if its wait has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, due)) if now >= *due => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    /// Take the pending value regardless of the wait.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value becomes ready.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(FILTER_DEBOUNCE)
    }
}
