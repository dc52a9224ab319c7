//! Error types for configuration, job execution, clock access and scheduling.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Startup configuration problems. Always fatal: the run loop never starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A start time was not a valid `yyyymmddHHMM` stamp.
    #[error("invalid start time `{value}`: expected yyyymmddHHMM")]
    InvalidStartTime {
        /// The offending input.
        value: String,
    },
    /// The target date was not a valid `yyyymmdd` date.
    #[error("invalid date `{value}`: expected yyyymmdd")]
    InvalidDate {
        /// The offending input.
        value: String,
    },
    /// Poll series parameters cannot produce a series.
    #[error("invalid poll series: {0}")]
    InvalidSeries(String),
    /// A configuration value is out of range.
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting {
        /// Setting name.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// Event metadata could not be read or decoded.
    #[error("event catalog {path}: {reason}")]
    Catalog {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },
}

/// Failure of one sampling attempt. Recovered at the job boundary.
#[derive(Debug, Error)]
pub enum JobError {
    /// The sample source could not be reached or refused the request.
    #[error("fetch failed: {0}")]
    Fetch(String),
    /// The sample source answered with something that could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The storage sink rejected the records.
    #[error("sink write failed: {0}")]
    Sink(String),
    /// The attempt did not finish within the configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The job panicked.
    #[error("job panicked: {0}")]
    Panicked(String),
    /// The task running the job was dropped before it finished, for example
    /// because its runtime shut down.
    #[error("job task dropped before completion")]
    Abandoned,
}

impl JobError {
    /// Whether another attempt could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Timeout(_))
    }
}

/// The time source cannot be trusted; dispatch ordering depends on it.
#[derive(Debug, Error)]
pub enum ClockError {
    /// Reading the system clock failed.
    #[error("system clock unavailable: {0}")]
    Unavailable(String),
}

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Queue is full.
    #[error("queue full: {0}")]
    QueueFull(String),
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Clock failure.
    #[error(transparent)]
    Clock(#[from] ClockError),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
