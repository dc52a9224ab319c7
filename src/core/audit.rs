//! Audit sink implementations.
//!
//! The scheduler reports every entry transition (registered, dispatched,
//! completed, failed, missed, cancelled) to an optional [`AuditSink`] so an
//! external observability layer can reconstruct what fired and when.

use std::collections::VecDeque;
use std::fmt;

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::{EntryId, EventId};

/// Transition recorded for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Entry accepted into the queue.
    Registered,
    /// Entry handed to an execution context.
    Dispatched,
    /// Job recorded its samples.
    Completed,
    /// Job failed after all attempts.
    Failed,
    /// Entry skipped because it was too late.
    Missed,
    /// Entry removed before it became due.
    Cancelled,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Registered => "registered",
            Self::Dispatched => "dispatched",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Missed => "missed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Unique identifier of this audit record.
    pub audit_id: Uuid,
    /// Queue entry concerned, if the transition is per-entry.
    pub entry: Option<EntryId>,
    /// Event concerned.
    pub event: EventId,
    /// Transition.
    pub action: AuditAction,
    /// Instant the entry was scheduled for.
    pub scheduled_at: Option<NaiveDateTime>,
    /// Clock time when the transition happened.
    pub recorded_at: NaiveDateTime,
    /// Additional context (error text, sample count, cancelled count).
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(4096)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }

    /// Stored events with the given action, oldest first.
    #[must_use]
    pub fn with_action(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events.iter().filter(|e| e.action == action).cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    entry: Option<EntryId>,
    event: EventId,
    action: AuditAction,
    scheduled_at: Option<NaiveDateTime>,
    recorded_at: NaiveDateTime,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        audit_id: Uuid::new_v4(),
        entry,
        event,
        action,
        scheduled_at,
        recorded_at,
        detail,
    }
}
