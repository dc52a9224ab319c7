//! Runtime adapters for executing dispatched jobs.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
