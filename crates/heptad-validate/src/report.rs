//! Validation reports: result records and the memory-footprint snapshots
//! attached to them.

use crate::shapes::ConstraintKind;
use heptad_store::Term;

/// Severity of one non-conforming check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Violation,
    MemoryViolation,
}

/// A point-in-time view of a property's tracked memory usage against its
/// shape-level and graph-level ceilings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemorySnapshot {
    pub current: u64,
    pub peak: u64,
    pub max_allowed: u64,
    pub bounded: bool,
}

impl MemorySnapshot {
    pub(crate) fn within(current: u64, peak: u64, max_allowed: u64) -> Self {
        Self {
            current,
            peak,
            max_allowed,
            bounded: current <= max_allowed,
        }
    }
}

/// One non-conforming check, appended to a [`Report`] when a constraint fails.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub focus_node: Term,
    pub path: Term,
    pub constraint_kind: ConstraintKind,
    pub severity: Severity,
    pub message: String,
    pub memory: MemorySnapshot,
}

/// A validation run's accumulated result records.
///
/// `conforms` is false iff any [`Severity::Violation`] or
/// [`Severity::MemoryViolation`] result is present; callers may still attach
/// `Info`/`Warning` results without affecting conformance.
#[derive(Debug, Clone, Default)]
pub struct Report {
    results: Vec<ValidationResult>,
    pub elapsed_cycles: u64,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, result: ValidationResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn conforms(&self) -> bool {
        !self
            .results
            .iter()
            .any(|r| matches!(r.severity, Severity::Violation | Severity::MemoryViolation))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
