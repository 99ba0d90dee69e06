#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! SHACL-style constraint validator over a [`heptad_store::TripleStore`],
//! backed by a direct-mapped property-count cache.

pub mod cache;
pub mod report;
pub mod shapes;
pub mod validator;

pub use cache::{PropertyCountCache, DEFAULT_CACHE_SIZE};
pub use report::{MemorySnapshot, Report, Severity, ValidationResult};
pub use shapes::{
    Constraint, ConstraintKind, NodeKindFilter, Shape, SHACL_MAX_MEMORY_PER_GRAPH, SHACL_MAX_MEMORY_PER_NODE,
};
pub use validator::{ValidateError, Validator};
