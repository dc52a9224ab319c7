//! Shared utilities: clock, timestamp stamps, telemetry.

pub mod clock;
pub mod stamp;
pub mod telemetry;

pub use clock::*;
pub use stamp::*;
pub use telemetry::*;
