//! Infrastructure adapters: queue backend, event catalog, sample sources and sinks.

pub mod catalog;
pub mod queue;
pub mod sink;
pub mod source;

pub use queue::InMemoryDelayQueue;
pub use sink::{CsvSampleSink, MemorySampleSink};
pub use source::HttpSampleSource;
