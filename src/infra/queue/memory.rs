//! In-memory delay queue ordered by due instant, priority and insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::NaiveDateTime;

use crate::core::{DelayQueue, EventId, ScheduledEntry, SchedulerError};

/// Wrapper to make `ScheduledEntry` orderable for a max-heap: earliest instant
/// first, then lowest priority value, then lowest sequence number.
struct DueEntry {
    entry: ScheduledEntry,
}

impl PartialEq for DueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.entry.id == other.entry.id
    }
}

impl Eq for DueEntry {}

impl PartialOrd for DueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the smallest key sits at the top of the max-heap
        other.entry.order_key().cmp(&self.entry.order_key())
    }
}

/// In-memory queue storing scheduled entries in a binary heap.
/// This provides O(log n) push and O(log n) pop operations.
pub struct InMemoryDelayQueue {
    max_depth: usize,
    entries: BinaryHeap<DueEntry>,
}

impl InMemoryDelayQueue {
    /// Create a new in-memory queue with a maximum depth.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            entries: BinaryHeap::with_capacity(max_depth.min(1024)),
        }
    }
}

impl DelayQueue for InMemoryDelayQueue {
    fn push(&mut self, entry: ScheduledEntry) -> Result<(), SchedulerError> {
        if self.len() >= self.max_depth() {
            return Err(SchedulerError::QueueFull(format!(
                "max queue depth {} reached",
                self.max_depth
            )));
        }
        self.entries.push(DueEntry { entry });
        Ok(())
    }

    fn next_due_at(&self) -> Option<NaiveDateTime> {
        self.entries.peek().map(|due| due.entry.execute_at)
    }

    fn pop_due(&mut self, now: NaiveDateTime) -> Option<ScheduledEntry> {
        if self.next_due_at()? > now {
            return None;
        }
        self.entries.pop().map(|due| due.entry)
    }

    fn remove_event(&mut self, event: &EventId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|due| due.entry.event() != event);
        before - self.entries.len()
    }

    fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
