//! Sample sources.

pub mod http;

pub use http::HttpSampleSource;
