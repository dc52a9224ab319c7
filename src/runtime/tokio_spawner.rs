//! Tokio runtime spawner used to run dispatched sample jobs.

use std::future::Future;

use tokio::runtime::{Handle, Runtime};

use crate::core::Spawn;

/// Tokio-based spawner that runs each dispatched job as its own task.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: Handle,
}

impl TokioSpawner {
    /// Create a spawner from a tokio runtime handle.
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Spawner bound to the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Build a dedicated multi-threaded runtime with `worker_threads` workers.
    ///
    /// The runtime is returned alongside the spawner; dropping it stops every
    /// job spawned through the spawner.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised when the runtime cannot be built.
    pub fn with_worker_threads(worker_threads: usize) -> Result<(Self, Runtime), std::io::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("odds-sampler-job")
            .enable_all()
            .build()?;
        Ok((Self::new(runtime.handle().clone()), runtime))
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}
