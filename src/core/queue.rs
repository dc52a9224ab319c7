//! Delayed job queue abstraction.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;

use super::{EventId, Job, SchedulerError};

/// Registration sequence number; doubles as the insertion-order tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tie-break between entries due at the same instant. Lower values dispatch first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    /// Priority used for sample jobs unless configured otherwise.
    pub const DEFAULT: Self = Self(1);
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A job waiting for its instant.
#[derive(Clone)]
pub struct ScheduledEntry {
    /// Sequence number assigned at registration.
    pub id: EntryId,
    /// Instant the job becomes due.
    pub execute_at: NaiveDateTime,
    /// Tie-break for equal instants.
    pub priority: Priority,
    /// The capability to run.
    pub job: Arc<dyn Job>,
}

impl ScheduledEntry {
    /// Event the entry's job is bound to.
    #[must_use]
    pub fn event(&self) -> &EventId {
        self.job.event()
    }

    /// Total dispatch order: instant, then priority, then insertion order.
    #[must_use]
    pub const fn order_key(&self) -> (NaiveDateTime, Priority, EntryId) {
        (self.execute_at, self.priority, self.id)
    }
}

impl fmt::Debug for ScheduledEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledEntry")
            .field("id", &self.id)
            .field("execute_at", &self.execute_at)
            .field("priority", &self.priority)
            .field("event", self.event())
            .finish_non_exhaustive()
    }
}

/// Abstraction for delayed queue backends.
pub trait DelayQueue: Send + 'static {
    /// Insert an entry if space permits.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::QueueFull`] at the configured depth.
    fn push(&mut self, entry: ScheduledEntry) -> Result<(), SchedulerError>;
    /// Instant of the earliest entry, if any.
    fn next_due_at(&self) -> Option<NaiveDateTime>;
    /// Remove and return the earliest entry if it is due at `now`.
    fn pop_due(&mut self, now: NaiveDateTime) -> Option<ScheduledEntry>;
    /// Remove every entry bound to `event` and return how many were removed.
    fn remove_event(&mut self, event: &EventId) -> usize;
    /// Drop all entries and return how many were removed.
    fn clear(&mut self) -> usize;
    /// Maximum depth allowed for this queue.
    fn max_depth(&self) -> usize;
    /// Current depth.
    fn len(&self) -> usize;
    /// Whether no entries are waiting.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
