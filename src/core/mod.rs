//! Core scheduling abstractions: poll series, delayed queue, jobs, dispatch loop.

pub mod audit;
pub mod error;
pub mod event;
pub mod isolation;
pub mod job;
pub mod queue;
pub mod registrar;
pub mod scheduler;
pub mod series;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use error::{AppResult, ClockError, ConfigError, JobError, SchedulerError};
pub use event::{Event, EventId, SampleRecord};
pub use isolation::{execute_guarded, JobOutcome, RetryPolicy};
pub use job::{Job, JobContext, SampleJob, SampleSink, SampleSource};
pub use queue::{DelayQueue, EntryId, Priority, ScheduledEntry};
pub use registrar::{EventPlan, EventRegistrar, RegistrationReport};
pub use scheduler::{DispatchLimits, RunSummary, Scheduler, SchedulerHandle, Spawn};
pub use series::{generate, PollSeries, DEFAULT_STEP_MINUTES, DEFAULT_WINDOW_MINUTES};
