//! In-memory sample sink.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{EventId, JobError, SampleRecord, SampleSink};

#[derive(Default)]
struct Stored {
    records: Vec<SampleRecord>,
    append_calls: usize,
}

/// Keeps every appended record per event, in append order.
#[derive(Default)]
pub struct MemorySampleSink {
    events: Mutex<HashMap<EventId, Stored>>,
}

impl MemorySampleSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records appended for `event`, oldest first.
    #[must_use]
    pub fn records(&self, event: &EventId) -> Vec<SampleRecord> {
        self.events
            .lock()
            .get(event)
            .map(|s| s.records.clone())
            .unwrap_or_default()
    }

    /// Number of `append_records` calls made for `event`.
    #[must_use]
    pub fn append_calls(&self, event: &EventId) -> usize {
        self.events.lock().get(event).map_or(0, |s| s.append_calls)
    }

    /// Total records across all events.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.events.lock().values().map(|s| s.records.len()).sum()
    }
}

#[async_trait]
impl SampleSink for MemorySampleSink {
    async fn append_records(&self, event: &EventId, records: &[SampleRecord]) -> Result<(), JobError> {
        let mut events = self.events.lock();
        let stored = events.entry(event.clone()).or_default();
        stored.append_calls += 1;
        stored.records.extend_from_slice(records);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::stamp::parse_minute_stamp;

    #[tokio::test]
    async fn test_appends_preserve_order_per_event() {
        let sink = MemorySampleSink::new();
        let a = EventId::new("g", "1");
        let b = EventId::new("g", "2");
        let at = parse_minute_stamp("202203041000").unwrap();
        let record = |name: &str| SampleRecord {
            subject_name: name.to_string(),
            value: "1.5".to_string(),
            observed_at: at,
        };

        sink.append_records(&a, &[record("x"), record("y")]).await.unwrap();
        sink.append_records(&b, &[record("z")]).await.unwrap();
        sink.append_records(&a, &[]).await.unwrap();

        let names: Vec<_> = sink.records(&a).into_iter().map(|r| r.subject_name).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(sink.append_calls(&a), 2);
        assert_eq!(sink.append_calls(&b), 1);
        assert_eq!(sink.total_records(), 3);
        assert_eq!(sink.append_calls(&EventId::new("g", "9")), 0);
    }
}
