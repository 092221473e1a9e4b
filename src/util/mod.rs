//! Identifiers, clocks and telemetry shared across the crate.

pub mod clock;
pub mod serde;
pub mod telemetry;

pub use self::clock::*;
pub use self::serde::*;
pub use self::telemetry::*;
