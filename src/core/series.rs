//! Countdown poll series: the instants at which one event is sampled.
//!
//! A series for start time `T` runs from `T - window` to `T` inclusive in fixed
//! steps, oldest first. With the defaults (480 minute window, 5 minute step)
//! that is 97 instants, the first one eight hours before the start.

use chrono::{NaiveDateTime, TimeDelta};
use tracing::warn;

use super::ConfigError;

/// Default countdown window in minutes (eight hours).
pub const DEFAULT_WINDOW_MINUTES: u32 = 480;
/// Default spacing between instants in minutes.
pub const DEFAULT_STEP_MINUTES: u32 = 5;

/// Validated series parameters.
///
/// A window that is not a multiple of the step is truncated to the nearest
/// lower multiple; a zero step is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSeries {
    window_minutes: u32,
    step_minutes: u32,
}

impl PollSeries {
    /// Build series parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSeries`] when `step_minutes` is zero.
    pub fn new(window_minutes: u32, step_minutes: u32) -> Result<Self, ConfigError> {
        if step_minutes == 0 {
            return Err(ConfigError::InvalidSeries(
                "step_minutes must be greater than 0".into(),
            ));
        }
        let effective = window_minutes - window_minutes % step_minutes;
        if effective != window_minutes {
            warn!(
                window_minutes,
                step_minutes,
                effective_window_minutes = effective,
                "poll window is not a multiple of the step; truncating"
            );
        }
        Ok(Self {
            window_minutes: effective,
            step_minutes,
        })
    }

    /// Effective window after truncation.
    #[must_use]
    pub const fn window_minutes(&self) -> u32 {
        self.window_minutes
    }

    /// Spacing between consecutive instants.
    #[must_use]
    pub const fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    /// Number of instants in every series.
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.window_minutes / self.step_minutes) as usize + 1
    }

    /// A series always holds at least the start time itself.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Instants for an event starting at `start`, ascending, ending at `start`.
    #[must_use]
    pub fn generate(&self, start: NaiveDateTime) -> Vec<NaiveDateTime> {
        let steps = self.window_minutes / self.step_minutes;
        (0..=steps)
            .rev()
            .map(|i| start - TimeDelta::minutes(i64::from(i * self.step_minutes)))
            .collect()
    }
}

impl Default for PollSeries {
    fn default() -> Self {
        Self {
            window_minutes: DEFAULT_WINDOW_MINUTES,
            step_minutes: DEFAULT_STEP_MINUTES,
        }
    }
}

/// One-shot form of [`PollSeries::generate`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSeries`] when `step_minutes` is zero.
pub fn generate(
    start: NaiveDateTime,
    window_minutes: u32,
    step_minutes: u32,
) -> Result<Vec<NaiveDateTime>, ConfigError> {
    Ok(PollSeries::new(window_minutes, step_minutes)?.generate(start))
}
