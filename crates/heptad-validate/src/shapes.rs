//! Shape and constraint data model.

use heptad_store::{NodeKind, Term};

/// Per-node memory ceiling a shape's constraints may not collectively exceed.
pub const SHACL_MAX_MEMORY_PER_NODE: u64 = 1 << 20; // 1 MiB
/// Per-graph memory ceiling across every registered shape's constraints.
pub const SHACL_MAX_MEMORY_PER_GRAPH: u64 = 64 << 20; // 64 MiB

/// The object-category filter a `NODE_KIND` constraint checks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKindFilter {
    Iri,
    Blank,
    Literal,
    Any,
}

impl NodeKindFilter {
    pub fn matches(self, kind: NodeKind) -> bool {
        match self {
            NodeKindFilter::Any => true,
            NodeKindFilter::Iri => kind == NodeKind::Iri,
            NodeKindFilter::Blank => kind == NodeKind::Blank,
            NodeKindFilter::Literal => kind == NodeKind::Literal,
        }
    }
}

/// A single constraint kind, tagged per §3's variant list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintKind {
    MinCount(u32),
    MaxCount(u32),
    Class(Term),
    NodeKind(NodeKindFilter),
    Datatype(Term),
    MemoryBound(u32),
}

/// One constraint: a kind applied along `path`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub path: Term,
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn min_count(path: Term, n: u32) -> Self {
        Self {
            path,
            kind: ConstraintKind::MinCount(n),
        }
    }

    pub fn max_count(path: Term, n: u32) -> Self {
        Self {
            path,
            kind: ConstraintKind::MaxCount(n),
        }
    }

    pub fn class(path: Term, target_class: Term) -> Self {
        Self {
            path,
            kind: ConstraintKind::Class(target_class),
        }
    }

    pub fn node_kind(path: Term, filter: NodeKindFilter) -> Self {
        Self {
            path,
            kind: ConstraintKind::NodeKind(filter),
        }
    }

    pub fn datatype(path: Term, datatype: Term) -> Self {
        Self {
            path,
            kind: ConstraintKind::Datatype(datatype),
        }
    }

    pub fn memory_bound(path: Term, max_bytes: u32) -> Self {
        Self {
            path,
            kind: ConstraintKind::MemoryBound(max_bytes),
        }
    }
}

/// A named bundle of constraints scoped to a target class.
///
/// State machine: `Unloaded -> Loaded(active=true, constraints=[])` on
/// [`crate::Validator::register_shape`]; `add_constraint` only ever adds
/// within `Loaded`. There is no terminal state within an engine's lifetime.
#[derive(Debug, Clone)]
pub struct Shape {
    pub id: u32,
    pub target_class: Term,
    pub active: bool,
    pub constraints: Vec<Constraint>,
}

impl Shape {
    pub(crate) fn new(id: u32, target_class: Term) -> Self {
        Self {
            id,
            target_class,
            active: true,
            constraints: Vec::new(),
        }
    }
}
