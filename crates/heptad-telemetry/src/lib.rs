#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! Telemetry: an optional, build-time feature-gated span layer (see
//! [`span`]) and the always-on JSON benchmark surface (see [`report`]).
//!
//! This is deliberately lean. The distributed-tracing exporter, OTLP
//! transport, and live-check tooling this crate's lineage once carried are
//! out of scope here; this crate emits cycle-annotated span records and a
//! pass/fail JSON summary, nothing more.

pub mod report;
pub mod span;

pub use report::BenchmarkReport;
pub use span::{ScopedSpan, Span, SpanRecorder};
