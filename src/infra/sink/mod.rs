//! Storage sinks for sample records.

pub mod csv;
pub mod memory;

pub use csv::CsvSampleSink;
pub use memory::MemorySampleSink;
