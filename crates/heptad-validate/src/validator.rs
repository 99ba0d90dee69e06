//! Per-shape validators and the top-level [`Validator`] registry.

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::warn;

use heptad_store::{Dictionary, Term, TripleStore};

use crate::cache::PropertyCountCache;
use crate::report::{MemorySnapshot, Report, Severity, ValidationResult};
use crate::shapes::{Constraint, ConstraintKind, Shape, SHACL_MAX_MEMORY_PER_GRAPH, SHACL_MAX_MEMORY_PER_NODE};

/// Width of the stack probe buffer used for early-exit `max_count` scans:
/// large enough to avoid the `count_objects` fallback for every scenario in
/// this engine's test corpus. `class`/`node_kind`/`datatype` checks don't
/// use this — they walk every object via [`TripleStore::for_each_object`],
/// since a missed object past a fixed probe width would be a missed
/// violation, not just a slower path.
const PROBE_WIDTH: usize = 256;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidateError {
    #[error("shape {0} is not registered")]
    NotFound(u32),
    #[error("shape {shape_id} constraint memory would exceed bound: {requested} > {bound}")]
    Capacity {
        shape_id: u32,
        requested: u64,
        bound: u64,
    },
}

/// Owns every registered shape, the shared property-count cache, and the
/// running memory ledger constraints are charged against.
pub struct Validator {
    rdf_type_predicate: Term,
    shapes: FxHashMap<u32, Shape>,
    shape_order: Vec<u32>,
    cache: PropertyCountCache,
    shape_memory_bytes: FxHashMap<u32, u64>,
    graph_memory_bytes: u64,
}

impl Validator {
    pub fn new(rdf_type_predicate: Term, cache_size: usize) -> Self {
        Self {
            rdf_type_predicate,
            shapes: FxHashMap::default(),
            shape_order: Vec::new(),
            cache: PropertyCountCache::new(cache_size),
            shape_memory_bytes: FxHashMap::default(),
            graph_memory_bytes: 0,
        }
    }

    /// `Unloaded -> Loaded(active=true, constraints=[])`.
    pub fn register_shape(&mut self, id: u32, target_class: Term) {
        self.shapes.insert(id, Shape::new(id, target_class));
        self.shape_order.push(id);
    }

    /// Appends `constraint` to `shape_id`, charging its approximate size
    /// against both the per-shape and per-graph memory ceilings.
    pub fn add_constraint(&mut self, shape_id: u32, constraint: Constraint) -> Result<(), ValidateError> {
        let cost = std::mem::size_of::<Constraint>() as u64;
        let shape_total = self.shape_memory_bytes.get(&shape_id).copied().unwrap_or(0) + cost;
        if shape_total > SHACL_MAX_MEMORY_PER_NODE {
            warn!(shape_id, requested = shape_total, bound = SHACL_MAX_MEMORY_PER_NODE, "shape memory ceiling exceeded");
            return Err(ValidateError::Capacity {
                shape_id,
                requested: shape_total,
                bound: SHACL_MAX_MEMORY_PER_NODE,
            });
        }
        let graph_total = self.graph_memory_bytes + cost;
        if graph_total > SHACL_MAX_MEMORY_PER_GRAPH {
            warn!(shape_id, requested = graph_total, bound = SHACL_MAX_MEMORY_PER_GRAPH, "graph memory ceiling exceeded");
            return Err(ValidateError::Capacity {
                shape_id,
                requested: graph_total,
                bound: SHACL_MAX_MEMORY_PER_GRAPH,
            });
        }
        let shape = self
            .shapes
            .get_mut(&shape_id)
            .ok_or(ValidateError::NotFound(shape_id))?;
        shape.constraints.push(constraint);
        self.shape_memory_bytes.insert(shape_id, shape_total);
        self.graph_memory_bytes = graph_total;
        Ok(())
    }

    /// Clears the property-count cache wholesale. The owning engine calls
    /// this after every store mutation.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Pre-populates the property-count cache for `nodes` against every
    /// constraint path referenced by a registered shape.
    pub fn warmup(&mut self, store: &TripleStore, nodes: &[Term]) {
        let paths: Vec<Term> = self
            .shapes
            .values()
            .flat_map(|s| s.constraints.iter().map(|c| c.path))
            .collect();
        for &node in nodes {
            for &path in &paths {
                let count = store.count_objects(node, path);
                self.cache.insert(node, path, count);
            }
        }
    }

    fn property_count(&mut self, store: &TripleStore, node: Term, path: Term) -> u32 {
        if let Some(count) = self.cache.get(node, path) {
            return count;
        }
        let count = store.count_objects(node, path);
        self.cache.insert(node, path, count);
        count
    }

    fn max_count_exceeded(&self, store: &TripleStore, node: Term, path: Term, n: u32) -> bool {
        let probe_needed = n as usize + 1;
        if probe_needed <= PROBE_WIDTH {
            let mut buf = [0u32; PROBE_WIDTH];
            let produced = store.objects_of(node, path, &mut buf[..probe_needed]);
            produced as u32 > n
        } else {
            store.count_objects(node, path) > n
        }
    }

    fn check_constraint(
        &mut self,
        store: &TripleStore,
        dictionary: &Dictionary,
        node: Term,
        constraint: &Constraint,
    ) -> Option<(Severity, String)> {
        let path = constraint.path;
        match constraint.kind {
            ConstraintKind::MinCount(n) => {
                let count = self.property_count(store, node, path);
                if count >= n {
                    None
                } else {
                    Some((Severity::Violation, format!("min_count: have {count}, need {n}")))
                }
            }
            ConstraintKind::MaxCount(n) => {
                if self.max_count_exceeded(store, node, path, n) {
                    Some((Severity::Violation, format!("max_count: exceeded {n}")))
                } else {
                    None
                }
            }
            ConstraintKind::Class(target_class) => {
                let rdf_type_predicate = self.rdf_type_predicate;
                let mut violation = None;
                store.for_each_object(node, path, |o| {
                    if !store.ask_pattern(o, rdf_type_predicate, target_class) {
                        violation = Some((Severity::Violation, format!("class: object {o} not rdf:type {target_class}")));
                        return false;
                    }
                    true
                });
                violation
            }
            ConstraintKind::NodeKind(filter) => {
                let mut violation = None;
                store.for_each_object(node, path, |o| {
                    if !filter.matches(dictionary.node_kind(o)) {
                        violation = Some((Severity::Violation, format!("node_kind: object {o} does not match {filter:?}")));
                        return false;
                    }
                    true
                });
                violation
            }
            ConstraintKind::Datatype(expected) => {
                let mut violation = None;
                store.for_each_object(node, path, |o| {
                    if dictionary.datatype(o) != Some(expected) {
                        violation = Some((Severity::Violation, format!("datatype: object {o} is not {expected}")));
                        return false;
                    }
                    true
                });
                violation
            }
            ConstraintKind::MemoryBound(max_bytes) => {
                let count = self.property_count(store, node, path);
                let observed = count as u64 * std::mem::size_of::<Term>() as u64;
                if observed > max_bytes as u64 {
                    Some((
                        Severity::MemoryViolation,
                        format!("memory_bound: {observed} bytes exceeds {max_bytes}"),
                    ))
                } else {
                    None
                }
            }
        }
    }

    /// Validates `node` against one shape. Short-circuits: a failing
    /// target-class check returns `true` (node out of scope, no report
    /// entry) before any constraint runs; a failing constraint appends one
    /// report entry and returns `false` without evaluating the rest.
    pub fn validate(
        &mut self,
        store: &TripleStore,
        dictionary: &Dictionary,
        shape_id: u32,
        node: Term,
        mut report: Option<&mut Report>,
    ) -> Result<bool, ValidateError> {
        let shape = self
            .shapes
            .get(&shape_id)
            .cloned()
            .ok_or(ValidateError::NotFound(shape_id))?;

        if !shape.active {
            return Ok(true);
        }
        if !store.ask_pattern(node, self.rdf_type_predicate, shape.target_class) {
            return Ok(true);
        }

        for constraint in &shape.constraints {
            if let Some((severity, message)) = self.check_constraint(store, dictionary, node, constraint) {
                if let Some(r) = report.as_deref_mut() {
                    r.push(ValidationResult {
                        focus_node: node,
                        path: constraint.path,
                        constraint_kind: constraint.kind,
                        severity,
                        message,
                        memory: MemorySnapshot::within(
                            self.shape_memory_bytes.get(&shape_id).copied().unwrap_or(0),
                            self.shape_memory_bytes.get(&shape_id).copied().unwrap_or(0),
                            SHACL_MAX_MEMORY_PER_NODE,
                        ),
                    });
                }
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Validates `node` against every registered shape, in registration
    /// order, short-circuiting at the first shape that rejects it.
    pub fn validate_all(
        &mut self,
        store: &TripleStore,
        dictionary: &Dictionary,
        node: Term,
        mut report: Option<&mut Report>,
    ) -> Result<bool, ValidateError> {
        let order = self.shape_order.clone();
        for shape_id in order {
            let ok = self.validate(store, dictionary, shape_id, node, report.as_deref_mut())?;
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn shape(&self, shape_id: u32) -> Option<&Shape> {
        self.shapes.get(&shape_id)
    }
}
