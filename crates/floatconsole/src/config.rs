//! Console configuration.

use std::time::Duration;

use bridge::{RetryPolicy, TabId};
use common::limits::{EVICTION_BATCH, LOG_RETENTION_LIMIT};

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct FloatConsoleConfig {
    /// Entries kept before eviction starts.
    pub buffer_capacity: usize,
    /// Entries dropped per eviction.
    pub eviction_batch: usize,
    /// Retry policy for control commands.
    pub retry: RetryPolicy,
    /// Tab the overlay answers commands for.
    pub tab: TabId,
    /// Print captured calls to the process console as well.
    pub echo_native: bool,
    /// How long `settle` waits for the pipeline to drain.
    pub settle_timeout: Duration,
}

impl FloatConsoleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// No native echo; suited to tests and embedding.
    pub fn headless() -> Self {
        Self {
            echo_native: false,
            ..Self::default()
        }
    }

    /// Small buffer and quick retries.
    pub fn compact() -> Self {
        Self {
            buffer_capacity: 500,
            eviction_batch: 50,
            retry: RetryPolicy::new(2, Duration::from_millis(50), Duration::from_millis(250)),
            ..Self::default()
        }
    }

    /// Set buffer capacity; the eviction batch follows at 10%.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self.eviction_batch = (self.buffer_capacity / 10).max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_tab(mut self, tab: TabId) -> Self {
        self.tab = tab;
        self
    }

    pub fn with_native_echo(mut self, echo: bool) -> Self {
        self.echo_native = echo;
        self
    }
}

impl Default for FloatConsoleConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: LOG_RETENTION_LIMIT,
            eviction_batch: EVICTION_BATCH,
            retry: RetryPolicy::default(),
            tab: TabId(1),
            echo_native: true,
            settle_timeout: Duration::from_secs(1),
        }
    }
}
