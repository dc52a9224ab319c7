//! Job capability plus the sample source / storage sink seams it drives.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::debug;

use super::{EntryId, Event, EventId, JobError, SampleRecord};
use crate::util::clock::Clock;

/// Context handed to a job for one dispatch.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Queue entry being executed.
    pub entry: EntryId,
    /// Event the job is bound to.
    pub event: EventId,
    /// Instant the entry was scheduled for.
    pub scheduled_at: NaiveDateTime,
    /// Instant the run loop handed the entry off.
    pub dispatched_at: NaiveDateTime,
    /// 1-based attempt number within this dispatch.
    pub attempt: u32,
}

/// One sampling capability, bound to a single event.
///
/// The scheduler treats jobs as opaque apart from [`Job::event`], which it
/// uses for logging and per-event cancellation.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use odds_sampler::core::{EventId, Job, JobContext, JobError};
///
/// struct Ping(EventId);
///
/// #[async_trait]
/// impl Job for Ping {
///     fn event(&self) -> &EventId {
///         &self.0
///     }
///
///     async fn invoke(&self, _ctx: &JobContext) -> Result<usize, JobError> {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Event this job samples.
    fn event(&self) -> &EventId;

    /// Perform one attempt and return the number of samples recorded.
    async fn invoke(&self, ctx: &JobContext) -> Result<usize, JobError>;
}

/// External collaborator producing the current `(subject, value)` pairs for an event.
#[async_trait]
pub trait SampleSource: Send + Sync + 'static {
    /// Fetch the current samples, in source order.
    async fn fetch_current_samples(&self, event: &Event) -> Result<Vec<(String, String)>, JobError>;
}

/// External append-only store for sample records.
#[async_trait]
pub trait SampleSink: Send + Sync + 'static {
    /// Append `records` for `event` in the given order.
    async fn append_records(&self, event: &EventId, records: &[SampleRecord]) -> Result<(), JobError>;
}

/// The production job: fetch, stamp, append.
pub struct SampleJob {
    event: Event,
    source: Arc<dyn SampleSource>,
    sink: Arc<dyn SampleSink>,
    clock: Arc<dyn Clock>,
}

impl SampleJob {
    /// Bind a job to `event`.
    pub fn new(
        event: Event,
        source: Arc<dyn SampleSource>,
        sink: Arc<dyn SampleSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            event,
            source,
            sink,
            clock,
        }
    }
}

#[async_trait]
impl Job for SampleJob {
    fn event(&self) -> &EventId {
        &self.event.id
    }

    async fn invoke(&self, ctx: &JobContext) -> Result<usize, JobError> {
        let pairs = self.source.fetch_current_samples(&self.event).await?;
        let observed_at = self.clock.now();
        let records: Vec<SampleRecord> = pairs
            .into_iter()
            .map(|(subject_name, value)| SampleRecord {
                subject_name,
                value,
                observed_at,
            })
            .collect();

        self.sink.append_records(&self.event.id, &records).await?;
        debug!(
            event = %self.event.id,
            entry = %ctx.entry,
            samples = records.len(),
            "samples recorded"
        );
        Ok(records.len())
    }
}
