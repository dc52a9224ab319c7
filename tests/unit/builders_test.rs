//! Tests for builder modules

use std::sync::Arc;

use chrono::NaiveDate;
use odds_sampler::builders::{build_in_memory_scheduler, build_registrar, build_scheduler, build_sink, build_source};
use odds_sampler::config::{SamplerConfig, SinkBackendConfig};
use odds_sampler::core::{DelayQueue, SchedulerError};
use odds_sampler::infra::{InMemoryDelayQueue, MemorySampleSink};
use odds_sampler::runtime::TokioSpawner;
use odds_sampler::util::clock::{Clock, VirtualClock};
use odds_sampler::util::stamp::parse_minute_stamp;

fn clock() -> Arc<dyn Clock> {
    Arc::new(VirtualClock::starting_at(parse_minute_stamp("202203040000").unwrap()))
}

#[tokio::test]
async fn test_build_scheduler_uses_configured_depth() {
    let mut cfg = SamplerConfig::default();
    cfg.dispatch.max_queue_depth = 7;
    cfg.dispatch.max_concurrent_jobs = 2;

    let mut seen_depth = 0;
    let scheduler = build_scheduler(
        &cfg,
        |dispatch| {
            seen_depth = dispatch.max_queue_depth;
            Ok(InMemoryDelayQueue::new(dispatch.max_queue_depth))
        },
        clock(),
        TokioSpawner::current(),
    )
    .unwrap();

    assert_eq!(seen_depth, 7);
    assert_eq!(scheduler.limits().max_concurrent_jobs, 2);
    assert_eq!(scheduler.handle().pending(), 0);
}

#[tokio::test]
async fn test_build_scheduler_rejects_invalid_config() {
    let mut cfg = SamplerConfig::default();
    cfg.dispatch.max_queue_depth = 0;

    let result = build_in_memory_scheduler(&cfg, clock(), TokioSpawner::current());
    assert!(matches!(result, Err(SchedulerError::Config(_))));
}

#[test]
fn test_build_registrar_uses_series_and_priority() {
    let mut cfg = SamplerConfig::default();
    cfg.series.window_minutes = 30;
    cfg.series.step_minutes = 10;

    let registrar = build_registrar(
        &cfg,
        build_source(&cfg).unwrap(),
        Arc::new(MemorySampleSink::new()),
        clock(),
    )
    .unwrap();
    assert_eq!(registrar.series().len(), 4);
}

#[test]
fn test_build_sink_and_source() {
    let mut cfg = SamplerConfig::default();
    cfg.storage.sink = SinkBackendConfig::InMemory;
    let _sink = build_sink(&cfg, NaiveDate::from_ymd_opt(2022, 3, 4).unwrap());

    cfg.source.base_url = "   ".to_string();
    assert!(build_source(&cfg).is_err());
}

#[test]
fn test_queue_depth_reported() {
    let queue = InMemoryDelayQueue::new(42);
    assert_eq!(queue.max_depth(), 42);
}
