//! Builders to construct scheduler components from configuration.

pub mod scheduler_builder;

pub use scheduler_builder::{
    build_in_memory_scheduler, build_registrar, build_scheduler, build_sink, build_source,
};
