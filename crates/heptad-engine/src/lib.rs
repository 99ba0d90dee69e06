#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! The top-level engine crate: wires the arena, triple store, AOT query
//! executor, and constraint validator behind one lifecycle API, and
//! flattens their crate-scoped errors into [`EngineError`].

pub mod config;
pub mod engine;
pub mod error;

pub use config::HarnessConfig;
pub use engine::Engine;
pub use error::EngineError;

pub use heptad_query::{QueryPlan, QueryPlanBuilder, Row};
pub use heptad_store::{NodeKind, RangeHint, Term};
pub use heptad_telemetry::{BenchmarkReport, Span};
pub use heptad_validate::{Constraint, ConstraintKind, NodeKindFilter, Report, Severity, Shape};
