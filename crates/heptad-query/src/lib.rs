#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! AOT-compiled query plan executor.
//!
//! A [`plan::QueryPlan`] is a fixed micro-op tape over the five kernels in
//! `heptad-kernel`; [`executor::Executor`] dispatches by name and writes a
//! caller-supplied result buffer. Nothing here compiles a query at runtime —
//! plans are pre-built artefacts registered once at startup, standing in for
//! the offline generator's header-file emission.

pub mod executor;
pub mod plan;

pub use executor::{Executor, QueryError};
pub use plan::{QueryPlan, QueryPlanBuilder, Row, MAX_REGISTERS, S7T_SQL_MAX_ROWS};
