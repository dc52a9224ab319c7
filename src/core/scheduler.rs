//! Delayed job scheduler: one time-ordered queue, one dispatch loop.
//!
//! The loop only decides *when* a job starts. Each due job is handed to an
//! independently spawned task (through [`Spawn`]) and the loop immediately
//! goes back to waiting for the next instant, so a slow fetch for one event
//! never delays dispatch for another. Outcomes come back over a channel.
//!
//! Dispatch start order follows `(execute_at, priority, insertion order)`.
//! Completion order is unspecified.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify, Semaphore};
use tracing::{debug, info, warn};

use super::isolation::{execute_guarded, JobOutcome, RetryPolicy};
use super::{
    build_audit_event, AuditAction, AuditSink, DelayQueue, EntryId, EventId, Job, JobContext,
    JobError, Priority, ScheduledEntry, SchedulerError,
};
use crate::util::clock::Clock;

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Limits applied to every dispatch.
#[derive(Debug, Clone)]
pub struct DispatchLimits {
    /// Timeout and retry budget per dispatch.
    pub retry: RetryPolicy,
    /// Jobs allowed to execute at the same time.
    pub max_concurrent_jobs: usize,
    /// Skip entries that are later than this at dispatch time. `None` fires
    /// every late entry immediately.
    pub missed_grace: Option<Duration>,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_concurrent_jobs: 16,
            missed_grace: None,
        }
    }
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries registered over the scheduler's lifetime.
    pub registered: u64,
    /// Entries handed to an execution context.
    pub dispatched: u64,
    /// Dispatches that recorded their samples.
    pub succeeded: u64,
    /// Dispatches that failed after all attempts.
    pub failed: u64,
    /// Entries skipped for being too late.
    pub missed: u64,
    /// Entries removed by cancellation.
    pub cancelled: u64,
    /// Sample records written.
    pub samples: u64,
    /// Largest delay between an entry's instant and its dispatch.
    pub max_skew: Duration,
}

struct Shared<Q> {
    queue: Mutex<Q>,
    next_id: AtomicU64,
    registered: AtomicU64,
    cancelled: AtomicU64,
    wake: Notify,
    clock: Arc<dyn Clock>,
    audit: Option<Arc<Mutex<dyn AuditSink>>>,
}

impl<Q> Shared<Q> {
    fn record(
        &self,
        entry: Option<EntryId>,
        event: &EventId,
        action: AuditAction,
        scheduled_at: Option<NaiveDateTime>,
        detail: Option<String>,
    ) {
        if let Some(audit) = &self.audit {
            let recorded_at = self.clock.now();
            audit.lock().record(build_audit_event(
                entry,
                event.clone(),
                action,
                scheduled_at,
                recorded_at,
                detail,
            ));
        }
    }
}

/// Cloneable handle for registering and cancelling entries, usable while the
/// run loop is active.
pub struct SchedulerHandle<Q> {
    shared: Arc<Shared<Q>>,
}

impl<Q> Clone for SchedulerHandle<Q> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<Q: DelayQueue> SchedulerHandle<Q> {
    /// Queue `job` to run at `execute_at`.
    ///
    /// Wakes the run loop so an entry earlier than its current wait target is
    /// honoured.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::QueueFull`] when the queue is at capacity.
    pub fn register(
        &self,
        execute_at: NaiveDateTime,
        priority: Priority,
        job: Arc<dyn Job>,
    ) -> Result<EntryId, SchedulerError> {
        let id = EntryId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let event = job.event().clone();
        self.shared.queue.lock().push(ScheduledEntry {
            id,
            execute_at,
            priority,
            job,
        })?;
        self.shared.registered.fetch_add(1, Ordering::Relaxed);
        self.shared
            .record(Some(id), &event, AuditAction::Registered, Some(execute_at), None);
        self.shared.wake.notify_one();
        Ok(id)
    }

    /// Remove every pending entry for `event`. Entries already dispatched are
    /// unaffected.
    pub fn cancel_event(&self, event: &EventId) -> usize {
        let removed = self.shared.queue.lock().remove_event(event);
        if removed > 0 {
            self.shared.cancelled.fetch_add(removed as u64, Ordering::Relaxed);
            self.shared.record(
                None,
                event,
                AuditAction::Cancelled,
                None,
                Some(format!("{removed} entries")),
            );
            info!(event = %event, removed, "event cancelled");
            self.shared.wake.notify_one();
        }
        removed
    }

    /// Drop every pending entry. The run loop finishes once in-flight jobs settle.
    pub fn cancel_all(&self) -> usize {
        let removed = self.shared.queue.lock().clear();
        if removed > 0 {
            self.shared.cancelled.fetch_add(removed as u64, Ordering::Relaxed);
            warn!(removed, "all pending entries cancelled");
        }
        self.shared.wake.notify_one();
        removed
    }

    /// Entries waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Instant of the earliest pending entry.
    #[must_use]
    pub fn next_due_at(&self) -> Option<NaiveDateTime> {
        self.shared.queue.lock().next_due_at()
    }
}

/// The scheduler: owns the queue and drives the dispatch loop.
pub struct Scheduler<Q, S> {
    shared: Arc<Shared<Q>>,
    spawner: S,
    limits: DispatchLimits,
    permits: Arc<Semaphore>,
}

impl<Q, S> Scheduler<Q, S>
where
    Q: DelayQueue,
    S: Spawn,
{
    /// Create a scheduler over `queue`.
    pub fn new(queue: Q, clock: Arc<dyn Clock>, spawner: S, limits: DispatchLimits) -> Self {
        let permits = Arc::new(Semaphore::new(limits.max_concurrent_jobs.max(1)));
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(queue),
                next_id: AtomicU64::new(1),
                registered: AtomicU64::new(0),
                cancelled: AtomicU64::new(0),
                wake: Notify::new(),
                clock,
                audit: None,
            }),
            spawner,
            limits,
            permits,
        }
    }

    /// Attach an audit sink. Must happen before any handle is issued.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<Mutex<dyn AuditSink>>) -> Self {
        match Arc::get_mut(&mut self.shared) {
            Some(shared) => shared.audit = Some(audit),
            None => warn!("audit sink attached after handles were issued; ignored"),
        }
        self
    }

    /// Handle for registering and cancelling entries.
    #[must_use]
    pub fn handle(&self) -> SchedulerHandle<Q> {
        SchedulerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Limits applied to dispatches.
    #[must_use]
    pub const fn limits(&self) -> &DispatchLimits {
        &self.limits
    }

    /// Dispatch entries in order until the queue is empty and every dispatched
    /// job has settled.
    pub async fn run(&self) -> RunSummary {
        let (results_tx, mut results_rx) = mpsc::unbounded_channel::<JobOutcome>();
        let mut summary = RunSummary::default();
        let mut in_flight: usize = 0;

        info!(
            pending = self.shared.queue.lock().len(),
            max_concurrent_jobs = self.limits.max_concurrent_jobs,
            "scheduler run loop started"
        );

        loop {
            let now = self.shared.clock.now();
            while let Some(entry) = self.pop_due(now) {
                let lateness = (now - entry.execute_at).to_std().unwrap_or_default();
                if self.limits.missed_grace.is_some_and(|grace| lateness > grace) {
                    self.skip_missed(&entry, lateness, &mut summary);
                    continue;
                }
                summary.dispatched += 1;
                summary.max_skew = summary.max_skew.max(lateness);
                self.dispatch(entry, now, results_tx.clone());
                in_flight += 1;
            }

            while let Ok(outcome) = results_rx.try_recv() {
                in_flight -= 1;
                self.settle(outcome, &mut summary);
            }

            let next_due = self.shared.queue.lock().next_due_at();
            if next_due.is_none() && in_flight == 0 {
                break;
            }

            tokio::select! {
                () = wait_until(self.shared.clock.as_ref(), next_due) => {}
                () = self.shared.wake.notified() => {}
                Some(outcome) = results_rx.recv() => {
                    in_flight -= 1;
                    self.settle(outcome, &mut summary);
                }
            }
        }

        summary.registered = self.shared.registered.load(Ordering::Relaxed);
        summary.cancelled = self.shared.cancelled.load(Ordering::Relaxed);
        info!(
            registered = summary.registered,
            dispatched = summary.dispatched,
            succeeded = summary.succeeded,
            failed = summary.failed,
            missed = summary.missed,
            cancelled = summary.cancelled,
            samples = summary.samples,
            max_skew_ms = u64::try_from(summary.max_skew.as_millis()).unwrap_or(u64::MAX),
            "scheduler run loop finished"
        );
        summary
    }

    fn pop_due(&self, now: NaiveDateTime) -> Option<ScheduledEntry> {
        self.shared.queue.lock().pop_due(now)
    }

    fn skip_missed(&self, entry: &ScheduledEntry, lateness: Duration, summary: &mut RunSummary) {
        summary.missed += 1;
        warn!(
            event = %entry.event(),
            entry = %entry.id,
            scheduled_at = %entry.execute_at,
            lateness_secs = lateness.as_secs(),
            "entry missed its window; skipped"
        );
        self.shared.record(
            Some(entry.id),
            entry.event(),
            AuditAction::Missed,
            Some(entry.execute_at),
            None,
        );
    }

    fn dispatch(
        &self,
        entry: ScheduledEntry,
        now: NaiveDateTime,
        results: mpsc::UnboundedSender<JobOutcome>,
    ) {
        let context = JobContext {
            entry: entry.id,
            event: entry.event().clone(),
            scheduled_at: entry.execute_at,
            dispatched_at: now,
            attempt: 0,
        };
        debug!(
            event = %context.event,
            entry = %context.entry,
            scheduled_at = %context.scheduled_at,
            "dispatching"
        );
        self.shared.record(
            Some(entry.id),
            &context.event,
            AuditAction::Dispatched,
            Some(entry.execute_at),
            None,
        );

        let job = entry.job;
        let policy = self.limits.retry.clone();
        let permits = Arc::clone(&self.permits);
        let report = OutcomeReport::new(results, context.clone());
        self.spawner.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let outcome = execute_guarded(job.as_ref(), context, &policy).await;
            report.send(outcome);
        });
    }

    fn settle(&self, outcome: JobOutcome, summary: &mut RunSummary) {
        let ctx = &outcome.context;
        let (action, detail) = match &outcome.result {
            Ok(samples) => {
                summary.succeeded += 1;
                summary.samples += *samples as u64;
                (AuditAction::Completed, format!("{samples} samples"))
            }
            Err(e) => {
                summary.failed += 1;
                (AuditAction::Failed, e.to_string())
            }
        };
        self.shared.record(
            Some(ctx.entry),
            &ctx.event,
            action,
            Some(ctx.scheduled_at),
            Some(detail),
        );
    }
}

/// Sends exactly one outcome per dispatch. If the spawned task is dropped
/// before it finishes, the drop reports the dispatch as abandoned so the run
/// loop's in-flight count still reaches zero.
struct OutcomeReport {
    results: mpsc::UnboundedSender<JobOutcome>,
    pending: Option<JobContext>,
}

impl OutcomeReport {
    fn new(results: mpsc::UnboundedSender<JobOutcome>, context: JobContext) -> Self {
        Self {
            results,
            pending: Some(context),
        }
    }

    fn send(mut self, outcome: JobOutcome) {
        self.pending = None;
        // A send error means the run loop itself was dropped.
        let _ = self.results.send(outcome);
    }
}

impl Drop for OutcomeReport {
    fn drop(&mut self) {
        if let Some(context) = self.pending.take() {
            warn!(
                event = %context.event,
                entry = %context.entry,
                scheduled_at = %context.scheduled_at,
                "job task dropped before completion"
            );
            let _ = self.results.send(JobOutcome {
                context,
                attempts: 0,
                result: Err(JobError::Abandoned),
            });
        }
    }
}

async fn wait_until(clock: &dyn Clock, next_due: Option<NaiveDateTime>) {
    match next_due {
        Some(at) => clock.sleep_until(at).await,
        None => std::future::pending().await,
    }
}
