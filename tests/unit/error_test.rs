//! Tests for error types

use std::time::Duration;

use odds_sampler::core::{ClockError, ConfigError, JobError, SchedulerError};

#[test]
fn test_queue_full_error() {
    let err = SchedulerError::QueueFull("max queue depth 10 reached".to_string());
    assert_eq!(format!("{err}"), "queue full: max queue depth 10 reached");
}

#[test]
fn test_invalid_start_time_error() {
    let err = ConfigError::InvalidStartTime {
        value: "2022030410".to_string(),
    };
    assert_eq!(
        format!("{err}"),
        "invalid start time `2022030410`: expected yyyymmddHHMM"
    );
}

#[test]
fn test_config_error_is_transparent_in_scheduler_error() {
    let err: SchedulerError = ConfigError::InvalidSeries("step_minutes must be greater than 0".into()).into();
    assert!(matches!(err, SchedulerError::Config(_)));
    assert_eq!(format!("{err}"), "invalid poll series: step_minutes must be greater than 0");
}

#[test]
fn test_clock_error_converts() {
    let err: SchedulerError = ClockError::Unavailable("before epoch".into()).into();
    assert_eq!(format!("{err}"), "system clock unavailable: before epoch");
}

#[test]
fn test_retryable_job_errors() {
    assert!(JobError::Fetch("503".into()).is_retryable());
    assert!(JobError::Timeout(Duration::from_secs(1)).is_retryable());
    assert!(!JobError::Malformed("not json".into()).is_retryable());
    assert!(!JobError::Sink("disk full".into()).is_retryable());
    assert!(!JobError::Panicked("boom".into()).is_retryable());
    assert!(!JobError::Abandoned.is_retryable());
}

#[test]
fn test_job_error_display() {
    assert_eq!(format!("{}", JobError::Fetch("HTTP 503".into())), "fetch failed: HTTP 503");
    assert_eq!(format!("{}", JobError::Panicked("boom".into())), "job panicked: boom");
}
