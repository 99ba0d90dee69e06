#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! SIMD-dispatched scan, join, filter, and project kernels.
//!
//! Unsafe code is confined to the `#[target_feature]`-gated AVX2/NEON
//! functions in [`kernels`], each with a scalar fallback proven to agree
//! with it (see the crate's tests).

pub mod cpu_dispatch;
pub mod kernels;

pub use cpu_dispatch::CpuFeatures;
pub use kernels::{filter_gt_f32, hash_join, project, scan_by_predicate, scan_by_type, Row};
