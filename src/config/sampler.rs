//! Sampler configuration structures.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{
    ConfigError, DispatchLimits, PollSeries, Priority, RetryPolicy, DEFAULT_STEP_MINUTES,
    DEFAULT_WINDOW_MINUTES,
};

/// Storage sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkBackendConfig {
    /// One CSV file per event under the data directory.
    #[default]
    Csv,
    /// Keep records in memory only.
    InMemory,
}

/// Poll series parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    /// Countdown window before the start time.
    pub window_minutes: u32,
    /// Spacing between instants.
    pub step_minutes: u32,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            window_minutes: DEFAULT_WINDOW_MINUTES,
            step_minutes: DEFAULT_STEP_MINUTES,
        }
    }
}

/// Dispatch and isolation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Jobs allowed to execute at the same time.
    pub max_concurrent_jobs: usize,
    /// Maximum pending entries before registration is rejected.
    pub max_queue_depth: usize,
    /// Timeout for one sampling attempt, in seconds.
    pub attempt_timeout_secs: u64,
    /// Retries for retryable failures within one dispatch.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Skip entries later than this many seconds. Unset fires late entries immediately.
    pub missed_grace_secs: Option<u64>,
    /// Priority given to sample jobs.
    pub priority: i32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: num_cpus::get().max(1) * 4,
            max_queue_depth: 100_000,
            attempt_timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 2_000,
            missed_grace_secs: None,
            priority: Priority::DEFAULT.0,
        }
    }
}

/// Where the catalog is read from and samples are written to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding one directory per date.
    pub data_dir: PathBuf,
    /// Sink backend.
    pub sink: SinkBackendConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sink: SinkBackendConfig::default(),
        }
    }
}

/// HTTP sample source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the sample endpoint.
    pub base_url: String,
    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/odds".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Root sampler configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Poll series parameters.
    pub series: SeriesConfig,
    /// Dispatch limits.
    pub dispatch: DispatchConfig,
    /// Storage layout.
    pub storage: StorageConfig,
    /// Sample source.
    pub source: SourceConfig,
}

impl SamplerConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.series.step_minutes == 0 {
            return Err(ConfigError::InvalidSeries(
                "step_minutes must be greater than 0".into(),
            ));
        }
        let positive = |key: &'static str, ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::InvalidSetting {
                    key,
                    reason: "must be greater than 0".into(),
                })
            }
        };
        positive("dispatch.max_concurrent_jobs", self.dispatch.max_concurrent_jobs > 0)?;
        positive("dispatch.max_queue_depth", self.dispatch.max_queue_depth > 0)?;
        positive("dispatch.attempt_timeout_secs", self.dispatch.attempt_timeout_secs > 0)?;
        positive("source.request_timeout_secs", self.source.request_timeout_secs > 0)?;
        if self.source.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "source.base_url",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// Missing sections and fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for undecodable JSON, or the
    /// validation error.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| ConfigError::InvalidSetting {
            key: "config",
            reason: format!("parse error: {e}"),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path`, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] when the file cannot be read, or
    /// any error of [`SamplerConfig::from_json_str`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let body = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidSetting {
                    key: "config",
                    reason: format!("{}: {e}", path.display()),
                })?;
                Self::from_json_str(&body)
            }
            None => {
                let cfg = Self::default();
                cfg.validate()?;
                Ok(cfg)
            }
        }
    }

    /// Apply command-line or environment overrides.
    #[must_use]
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, base_url: Option<String>) -> Self {
        if let Some(dir) = data_dir {
            self.storage.data_dir = dir;
        }
        if let Some(url) = base_url {
            self.source.base_url = url;
        }
        self
    }

    /// Series parameters for the registrar.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSeries`] for a zero step.
    pub fn poll_series(&self) -> Result<PollSeries, ConfigError> {
        PollSeries::new(self.series.window_minutes, self.series.step_minutes)
    }

    /// Limits for the scheduler.
    #[must_use]
    pub fn dispatch_limits(&self) -> DispatchLimits {
        DispatchLimits {
            retry: RetryPolicy {
                attempt_timeout: Duration::from_secs(self.dispatch.attempt_timeout_secs),
                max_retries: self.dispatch.max_retries,
                backoff: Duration::from_millis(self.dispatch.retry_backoff_ms),
            },
            max_concurrent_jobs: self.dispatch.max_concurrent_jobs,
            missed_grace: self.dispatch.missed_grace_secs.map(Duration::from_secs),
        }
    }

    /// Priority for sample jobs.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        Priority(self.dispatch.priority)
    }

    /// Per-request timeout of the sample source.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.request_timeout_secs)
    }
}

/// `$HOME/odds-sampler/output`, or `./output` when no home directory is set.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from("output"),
        |home| PathBuf::from(home).join("odds-sampler").join("output"),
    )
}
