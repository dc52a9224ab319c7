//! Configuration models for the poll series, dispatch limits, storage and source.

pub mod sampler;

pub use sampler::{
    default_data_dir, DispatchConfig, SamplerConfig, SeriesConfig, SinkBackendConfig, SourceConfig,
    StorageConfig,
};
