//! Dense, append-only dictionary of RDF term metadata.
//!
//! Populated once at construction from the offline generator's output and
//! read-only thereafter; consulted by scans and the property-count cache to
//! narrow iteration ranges and classify terms.

use rustc_hash::FxHashMap;

/// Category of an RDF term, derived from its ID range by the offline generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Iri,
    Blank,
    Literal,
}

/// Half-open `[lo, hi)` interval a term's related object IDs are known to
/// live within, used to bound counting and predicate scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeHint {
    pub lo: u32,
    pub hi: u32,
}

/// Metadata attached to one dictionary entry.
#[derive(Debug, Clone, Copy)]
pub struct TermEntry {
    pub node_kind: NodeKind,
    pub datatype: Option<u32>,
    pub range_hint: Option<RangeHint>,
}

impl Default for TermEntry {
    fn default() -> Self {
        Self {
            node_kind: NodeKind::Iri,
            datatype: None,
            range_hint: None,
        }
    }
}

/// Read-only (after construction) term dictionary indexed by term ID.
#[derive(Debug, Default)]
pub struct Dictionary {
    entries: FxHashMap<u32, TermEntry>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite metadata for a term ID. Intended to be called
    /// only during the offline-generator load phase, before any engine
    /// query or validation traffic begins.
    pub fn insert(&mut self, term_id: u32, entry: TermEntry) {
        self.entries.insert(term_id, entry);
    }

    pub fn get(&self, term_id: u32) -> Option<&TermEntry> {
        self.entries.get(&term_id)
    }

    pub fn node_kind(&self, term_id: u32) -> NodeKind {
        self.entries
            .get(&term_id)
            .map(|e| e.node_kind)
            .unwrap_or(NodeKind::Iri)
    }

    pub fn range_hint(&self, term_id: u32) -> Option<RangeHint> {
        self.entries.get(&term_id).and_then(|e| e.range_hint)
    }

    pub fn datatype(&self, term_id: u32) -> Option<u32> {
        self.entries.get(&term_id).and_then(|e| e.datatype)
    }
}
