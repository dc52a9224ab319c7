//! Events, sample records and the identifiers tying them together.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::util::stamp::format_minute_stamp;

/// Opaque event key: the event group (meeting) plus its sequence number in the group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId {
    /// Group the event belongs to, e.g. a race meeting.
    pub group: String,
    /// Sequence number within the group.
    pub number: String,
}

impl EventId {
    /// Build an identifier from its two parts.
    pub fn new(group: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            number: number.into(),
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.number)
    }
}

/// A scheduled real-world occurrence with a fixed start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Identity of the event.
    pub id: EventId,
    /// Start time, minute resolution, local wall time.
    pub start_time: NaiveDateTime,
    /// Opaque parameter the sample source needs to locate this event, if any.
    pub source_ref: Option<String>,
}

impl Event {
    /// Create an event without a source reference.
    pub fn new(id: EventId, start_time: NaiveDateTime) -> Self {
        Self {
            id,
            start_time,
            source_ref: None,
        }
    }

    /// Attach the source reference.
    #[must_use]
    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, format_minute_stamp(self.start_time))
    }
}

/// One observed value for one subject of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Subject the value belongs to (e.g. a runner's name).
    pub subject_name: String,
    /// Observed value, kept verbatim.
    pub value: String,
    /// When the sample was taken.
    pub observed_at: NaiveDateTime,
}
