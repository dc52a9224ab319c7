//! Builders to construct the scheduler and its collaborators from configuration.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::config::{DispatchConfig, SamplerConfig, SinkBackendConfig};
use crate::core::{
    DelayQueue, EventRegistrar, SampleSink, SampleSource, Scheduler, SchedulerError, Spawn,
};
use crate::infra::{CsvSampleSink, HttpSampleSource, InMemoryDelayQueue, MemorySampleSink};
use crate::util::clock::Clock;

/// Build a scheduler from configuration using the provided queue factory.
///
/// # Errors
///
/// Returns [`SchedulerError::Config`] when the configuration is invalid, or
/// whatever the queue factory returns.
pub fn build_scheduler<Q, S, FQ>(
    cfg: &SamplerConfig,
    queue_factory: FQ,
    clock: Arc<dyn Clock>,
    spawner: S,
) -> Result<Scheduler<Q, S>, SchedulerError>
where
    Q: DelayQueue,
    S: Spawn,
    FQ: FnOnce(&DispatchConfig) -> Result<Q, SchedulerError>,
{
    cfg.validate()?;
    let queue = queue_factory(&cfg.dispatch)?;
    let limits = cfg.dispatch_limits();
    info!(
        max_concurrent_jobs = limits.max_concurrent_jobs,
        max_queue_depth = queue.max_depth(),
        attempt_timeout_secs = limits.retry.attempt_timeout.as_secs(),
        max_retries = limits.retry.max_retries,
        missed_grace_secs = ?limits.missed_grace.map(|g| g.as_secs()),
        "scheduler configured"
    );
    Ok(Scheduler::new(queue, clock, spawner, limits))
}

/// Build a scheduler over the in-memory delay queue.
///
/// # Errors
///
/// See [`build_scheduler`].
pub fn build_in_memory_scheduler<S: Spawn>(
    cfg: &SamplerConfig,
    clock: Arc<dyn Clock>,
    spawner: S,
) -> Result<Scheduler<InMemoryDelayQueue, S>, SchedulerError> {
    build_scheduler(
        cfg,
        |dispatch| Ok(InMemoryDelayQueue::new(dispatch.max_queue_depth)),
        clock,
        spawner,
    )
}

/// Build the configured storage sink for `date`.
#[must_use]
pub fn build_sink(cfg: &SamplerConfig, date: NaiveDate) -> Arc<dyn SampleSink> {
    match cfg.storage.sink {
        SinkBackendConfig::Csv => Arc::new(CsvSampleSink::new(&cfg.storage.data_dir, date)),
        SinkBackendConfig::InMemory => Arc::new(MemorySampleSink::new()),
    }
}

/// Build the HTTP sample source.
///
/// # Errors
///
/// Returns [`SchedulerError::Config`] for an unusable base URL.
pub fn build_source(cfg: &SamplerConfig) -> Result<Arc<dyn SampleSource>, SchedulerError> {
    let source = HttpSampleSource::new(&cfg.source.base_url, cfg.request_timeout())?;
    Ok(Arc::new(source))
}

/// Build the registrar binding events to `source` and `sink`.
///
/// # Errors
///
/// Returns [`SchedulerError::Config`] for invalid series parameters.
pub fn build_registrar(
    cfg: &SamplerConfig,
    source: Arc<dyn SampleSource>,
    sink: Arc<dyn SampleSink>,
    clock: Arc<dyn Clock>,
) -> Result<EventRegistrar, SchedulerError> {
    let series = cfg.poll_series()?;
    Ok(EventRegistrar::new(series, source, sink, clock).with_priority(cfg.priority()))
}
