//! # Odds Sampler
//!
//! A countdown poll scheduler: for every event of a day it samples the event's
//! current odds at fixed instants before the start time and appends each
//! sample to per-event storage.
//!
//! ## How it fits together
//!
//! - [`core::PollSeries`] turns a start time `T` into the instants
//!   `T-480min, T-475min, ..., T` (97 with the defaults).
//! - [`core::EventRegistrar`] binds one [`core::SampleJob`] to each event and
//!   registers one queue entry per instant.
//! - [`core::Scheduler`] owns a single time-ordered [`core::DelayQueue`] and
//!   dispatches every due entry onto its own task, so a slow source for one
//!   event never delays another. Failures, panics and timeouts are contained
//!   per dispatch.
//! - [`util::clock::Clock`] is the only source of time; tests drive a
//!   [`util::clock::VirtualClock`] under tokio's paused timer.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use odds_sampler::core::{DispatchLimits, EventRegistrar, PollSeries, Scheduler};
//! use odds_sampler::infra::{InMemoryDelayQueue, MemorySampleSink};
//! use odds_sampler::runtime::TokioSpawner;
//! use odds_sampler::util::clock::SystemClock;
//!
//! let clock = Arc::new(SystemClock);
//! let scheduler = Scheduler::new(
//!     InMemoryDelayQueue::new(10_000),
//!     clock.clone(),
//!     TokioSpawner::current(),
//!     DispatchLimits::default(),
//! );
//! let registrar = EventRegistrar::new(PollSeries::default(), my_source, Arc::new(MemorySampleSink::new()), clock);
//! registrar.register_all(&scheduler.handle(), events)?;
//! let summary = scheduler.run().await;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: series, queue, jobs and the dispatch loop.
pub mod core;
/// Configuration models for the series, dispatch limits, storage and source.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Infrastructure adapters: queue backend, catalog, sources and sinks.
pub mod infra;
/// Runtime adapters for executing dispatched jobs.
pub mod runtime;
/// Shared utilities: clock, timestamp stamps, telemetry.
pub mod util;
