//! Log buffer.

use std::collections::VecDeque;

use bridge::LogEvent;
use common::limits::{EVICTION_BATCH, LOG_RETENTION_LIMIT};

use crate::entry::{EntryId, LogEntry};

/// Append-only log store with hard-cap eviction.
///
/// Once the buffer holds `capacity` entries, the next append first drops the
/// oldest `eviction_batch` entries. Pinned entries are evicted like any
/// other: pinning affects display order only.
#[derive(Debug)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    next_id: u64,
    capacity: usize,
    eviction_batch: usize,
    evicted: u64,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::with_limits(LOG_RETENTION_LIMIT, EVICTION_BATCH)
    }

    pub fn with_limits(capacity: usize, eviction_batch: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::new(),
            next_id: 1,
            capacity,
            eviction_batch: eviction_batch.clamp(1, capacity),
            evicted: 0,
        }
    }

    /// Store an event and return its id.
    pub fn append(&mut self, event: LogEvent) -> EntryId {
        if self.entries.len() >= self.capacity {
            let count = self.eviction_batch.min(self.entries.len());
            self.entries.drain(..count);
            self.evicted += count as u64;
            tracing::debug!(count, "evicted oldest log entries");
        }

        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push_back(LogEntry::from_event(id, event));
        id
    }

    /// Drop every entry, pinned or not.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove one entry. Unknown ids are a no-op.
    pub fn delete(&mut self, id: EntryId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Flip the pin flag. Returns the new state, `None` for unknown ids.
    pub fn toggle_pin(&mut self, id: EntryId) -> Option<bool> {
        let index = self.position(id)?;
        let entry = &mut self.entries[index];
        entry.pinned = !entry.pinned;
        Some(entry.pinned)
    }

    pub fn get(&self, id: EntryId) -> Option<&LogEntry> {
        self.position(id).map(|index| &self.entries[index])
    }

    /// Entries in arrival order.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries evicted since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Ids grow with arrival order, so lookup is a binary search.
    fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.binary_search_by_key(&id, |entry| entry.id).ok()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}
