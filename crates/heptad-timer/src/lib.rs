#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! Cycle-accurate timing and tick-budget enforcement.
//!
//! All unsafe code is isolated to [`platform`] and documented with a safety
//! justification per function; everything above it is safe Rust.

pub mod platform;
pub mod timer;

pub use timer::{
    calibrate, read_cycles, read_cycles_fenced, read_cycles_serialized, CalibrationResult,
    HotPathTimer, ScopedTickMeasurement, TickBudget, TimerError,
};

/// Default ceiling for a primitive operation, in cycles.
pub const PRIMITIVE_CEILING: u64 = 7;

/// Default ceiling for a composite (multi-check) operation, in cycles.
pub const COMPOSITE_CEILING: u64 = 49;
