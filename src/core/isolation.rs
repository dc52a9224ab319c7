//! Failure isolation around a single job dispatch.
//!
//! Every attempt is bounded by a timeout and shielded from panics. Retryable
//! failures are retried with exponential backoff up to a fixed budget. The
//! final result is always returned as a [`JobOutcome`]; nothing propagates.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tracing::{error, warn};

use super::{Job, JobContext, JobError};

/// Timeout and retry budget applied to every dispatch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Upper bound for one attempt.
    pub attempt_timeout: Duration,
    /// Extra attempts after the first one for retryable failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(60),
            max_retries: 0,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Result of one dispatch after isolation.
#[derive(Debug)]
pub struct JobOutcome {
    /// Context of the final attempt.
    pub context: JobContext,
    /// Attempts made.
    pub attempts: u32,
    /// Samples recorded, or the last error.
    pub result: Result<usize, JobError>,
}

/// Run `job` under `policy`, converting every failure mode into an outcome.
pub async fn execute_guarded(job: &dyn Job, mut context: JobContext, policy: &RetryPolicy) -> JobOutcome {
    let mut attempt = 1;
    loop {
        context.attempt = attempt;
        let result = run_attempt(job, &context, policy.attempt_timeout).await;

        match result {
            Err(e) if e.is_retryable() && attempt <= policy.max_retries => {
                let delay = policy.backoff_for(attempt);
                warn!(
                    event = %context.event,
                    scheduled_at = %context.scheduled_at,
                    attempt,
                    retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "sample attempt failed; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!(
                    event = %context.event,
                    scheduled_at = %context.scheduled_at,
                    attempts = attempt,
                    error = %e,
                    "sample job failed; sample skipped"
                );
                return JobOutcome {
                    context,
                    attempts: attempt,
                    result: Err(e),
                };
            }
            Ok(samples) => {
                return JobOutcome {
                    context,
                    attempts: attempt,
                    result: Ok(samples),
                };
            }
        }
    }
}

async fn run_attempt(job: &dyn Job, context: &JobContext, timeout: Duration) -> Result<usize, JobError> {
    let attempt = AssertUnwindSafe(job.invoke(context)).catch_unwind();
    match tokio::time::timeout(timeout, attempt).await {
        Err(_) => Err(JobError::Timeout(timeout)),
        Ok(Err(panic)) => Err(JobError::Panicked(panic_message(panic.as_ref()))),
        Ok(Ok(result)) => result,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
