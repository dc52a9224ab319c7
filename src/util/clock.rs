//! Wall-clock abstraction used by the scheduler and by sample jobs.
//!
//! All instants are local wall time at minute resolution or finer
//! ([`NaiveDateTime`]), matching the `yyyymmddHHMM` stamps events are
//! published with.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, TimeDelta};

use crate::core::ClockError;

/// Source of the current time and of timed suspension.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Current local wall time.
    fn now(&self) -> NaiveDateTime;

    /// Suspend until `deadline`. Returns immediately if it has already passed.
    async fn sleep_until(&self, deadline: NaiveDateTime);

    /// Verify the clock can be read. Called once at startup.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] when the underlying time source is unusable.
    fn check(&self) -> Result<(), ClockError> {
        Ok(())
    }
}

/// Time remaining until `deadline`, clamped to zero for instants in the past.
#[must_use]
pub fn remaining(now: NaiveDateTime, deadline: NaiveDateTime) -> std::time::Duration {
    (deadline - now).to_std().unwrap_or_default()
}

/// Production clock backed by the operating system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep_until(&self, deadline: NaiveDateTime) {
        let wait = remaining(self.now(), deadline);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    fn check(&self) -> Result<(), ClockError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|_| ())
            .map_err(|e| ClockError::Unavailable(e.to_string()))
    }
}

/// Deterministic clock anchored at a fixed wall time and driven by tokio's timer.
///
/// Under a paused runtime (`#[tokio::test(start_paused = true)]`) tokio only
/// advances time when every task is idle, so a whole countdown series runs
/// instantly while each job still observes the exact instant it was due.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    origin: NaiveDateTime,
    started: tokio::time::Instant,
}

impl VirtualClock {
    /// Create a clock that reads `origin` right now.
    #[must_use]
    pub fn starting_at(origin: NaiveDateTime) -> Self {
        Self {
            origin,
            started: tokio::time::Instant::now(),
        }
    }
}

#[async_trait]
impl Clock for VirtualClock {
    fn now(&self) -> NaiveDateTime {
        TimeDelta::from_std(self.started.elapsed())
            .ok()
            .and_then(|elapsed| self.origin.checked_add_signed(elapsed))
            .unwrap_or(NaiveDateTime::MAX)
    }

    async fn sleep_until(&self, deadline: NaiveDateTime) {
        let wait = remaining(self.now(), deadline);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
