//! Delay queue backends.

pub mod memory;

pub use memory::InMemoryDelayQueue;
