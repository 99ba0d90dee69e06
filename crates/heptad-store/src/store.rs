//! Bitmap-indexed triple store.
//!
//! For each predicate, a subject-major grid of bitmaps over objects is kept:
//! `block[predicate][subject]` is a `row_words`-word bitmap over object IDs.
//! Every predicate's block starts at an offset that is a multiple of
//! [`WORDS_PER_CACHE_LINE`] words (64 bytes), and every subject's row within
//! a block is itself rounded up to a whole number of cache lines, so
//! `ask_pattern`'s single word load never straddles more than one predicate's
//! region.

use heptad_arena::{Arena, ArenaFlags, ArenaHandle};
use thiserror::Error;

/// 64-bit words per 64-byte cache line.
pub const WORDS_PER_CACHE_LINE: usize = 8;

/// A term ID (subject, predicate, or object).
pub type Term = u32;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("{field} {value} out of range: must be < {bound}")]
    InvalidArg {
        field: &'static str,
        value: u32,
        bound: u32,
    },
}

fn round_up(n: usize, multiple: usize) -> usize {
    (n + multiple - 1) / multiple * multiple
}

/// Fixed-dimension bitmap-indexed triple store.
///
/// The predicate blocks are allocated from an arena the store owns
/// internally, not a plain `Box<[u64]>`: every byte of the grid is arena
/// memory, reserved once at construction and never reallocated. The store
/// holds an [`ArenaHandle`] rather than a slice borrowed from its own
/// `arena` field, since a struct can't hold both an owned `Arena` and a
/// slice borrowed from that same field (that's a self-reference the
/// borrow checker can't express). A handle carries no lifetime, so it
/// sits next to the arena as an ordinary `Copy` field and is resolved back
/// into a slice on demand, one method call at a time.
pub struct TripleStore {
    max_subjects: u32,
    max_predicates: u32,
    max_objects: u32,
    row_words: usize,
    block_words: usize,
    arena: Arena,
    blocks: ArenaHandle<u64>,
}

impl TripleStore {
    /// Construct a store with fixed dimensions. Backing storage is a single
    /// arena region sized once at construction and never reallocated.
    pub fn new(max_subjects: u32, max_predicates: u32, max_objects: u32) -> Self {
        let row_words = round_up((max_objects as usize).div_ceil(64).max(1), WORDS_PER_CACHE_LINE);
        let block_words = row_words * max_subjects as usize;
        let total_words = (block_words * max_predicates as usize).max(1);
        let bytes = total_words * 8;
        tracing::debug!(max_subjects, max_predicates, max_objects, bytes, "triple store allocated");
        // +CACHE_LINE slack covers the arena's own initial alignment pad;
        // the handle below is sized to `total_words` exactly.
        let arena = Arena::create(bytes + heptad_arena::CACHE_LINE, ArenaFlags::empty());
        let blocks = arena
            .alloc_handle::<u64>(total_words)
            .expect("arena is sized exactly for its own predicate-bitmap blocks");
        Self {
            max_subjects,
            max_predicates,
            max_objects,
            row_words,
            block_words,
            arena,
            blocks,
        }
    }

    pub fn max_subjects(&self) -> u32 {
        self.max_subjects
    }

    pub fn max_predicates(&self) -> u32 {
        self.max_predicates
    }

    pub fn max_objects(&self) -> u32 {
        self.max_objects
    }

    fn check_bounds(&self, s: Term, p: Term, o: Term) -> Result<(), StoreError> {
        if s >= self.max_subjects {
            return Err(StoreError::InvalidArg {
                field: "subject",
                value: s,
                bound: self.max_subjects,
            });
        }
        if p >= self.max_predicates {
            return Err(StoreError::InvalidArg {
                field: "predicate",
                value: p,
                bound: self.max_predicates,
            });
        }
        if o >= self.max_objects {
            return Err(StoreError::InvalidArg {
                field: "object",
                value: o,
                bound: self.max_objects,
            });
        }
        Ok(())
    }

    #[inline]
    fn word_index(&self, s: Term, p: Term, o: Term) -> (usize, u32) {
        let row_start = p as usize * self.block_words + s as usize * self.row_words;
        let word = row_start + (o as usize / 64);
        let bit = o % 64;
        (word, bit)
    }

    /// Insert `(s, p, o)`. Idempotent: re-inserting an existing triple
    /// leaves the store bit-identical.
    pub fn add_triple(&mut self, s: Term, p: Term, o: Term) -> Result<(), StoreError> {
        if let Err(err) = self.check_bounds(s, p, o) {
            tracing::warn!(%err, s, p, o, "add_triple rejected out-of-range id");
            return Err(err);
        }
        let (word, bit) = self.word_index(s, p, o);
        self.arena.get_mut(self.blocks)[word] |= 1u64 << bit;
        Ok(())
    }

    /// Membership test. Out-of-range IDs return `false`, not an error: ASK
    /// is total over the full `u32` domain, only the in-range subset is
    /// ever actually populated.
    pub fn ask_pattern(&self, s: Term, p: Term, o: Term) -> bool {
        if self.check_bounds(s, p, o).is_err() {
            return false;
        }
        let (word, bit) = self.word_index(s, p, o);
        (self.arena.get(self.blocks)[word] >> bit) & 1 != 0
    }

    /// Subjects `s` with `(s, rdf_type_predicate, class)`, ascending, capped at `cap`.
    pub fn scan_by_type(&self, rdf_type_predicate: Term, class: Term, out: &mut [Term]) -> usize {
        if rdf_type_predicate >= self.max_predicates || class >= self.max_objects {
            return 0;
        }
        let cap = out.len();
        let mut n = 0usize;
        let bit = class % 64;
        let word_in_row = class as usize / 64;
        let block_start = rdf_type_predicate as usize * self.block_words;
        let blocks = self.arena.get(self.blocks);
        for s in 0..self.max_subjects {
            if n >= cap {
                break;
            }
            let word = block_start + s as usize * self.row_words + word_in_row;
            if (blocks[word] >> bit) & 1 != 0 {
                out[n] = s;
                n += 1;
            }
        }
        n
    }

    /// Subjects with any outgoing edge via `predicate`, ascending, capped at `cap`.
    pub fn scan_by_predicate(&self, predicate: Term, out: &mut [Term]) -> usize {
        if predicate >= self.max_predicates {
            return 0;
        }
        let cap = out.len();
        let mut n = 0usize;
        let block_start = predicate as usize * self.block_words;
        let blocks = self.arena.get(self.blocks);
        'subjects: for s in 0..self.max_subjects {
            if n >= cap {
                break;
            }
            let row_start = block_start + s as usize * self.row_words;
            for w in 0..self.row_words {
                if blocks[row_start + w] != 0 {
                    out[n] = s;
                    n += 1;
                    continue 'subjects;
                }
            }
        }
        n
    }

    /// Count distinct objects `node` has along `predicate`. Used directly by
    /// an uncached validator and by the property-count cache's warm path.
    pub fn count_objects(&self, node: Term, predicate: Term) -> u32 {
        if node >= self.max_subjects || predicate >= self.max_predicates {
            return 0;
        }
        let row_start = predicate as usize * self.block_words + node as usize * self.row_words;
        let blocks = self.arena.get(self.blocks);
        let mut count = 0u32;
        for w in 0..self.row_words {
            count += blocks[row_start + w].count_ones();
        }
        count
    }

    /// Iterate the distinct objects `node` has along `predicate`, ascending,
    /// capped at `out.len()`. Objects beyond the cap are silently skipped —
    /// callers that must see every object regardless of count should use
    /// [`TripleStore::for_each_object`] instead.
    pub fn objects_of(&self, node: Term, predicate: Term, out: &mut [Term]) -> usize {
        let cap = out.len();
        let mut n = 0usize;
        self.for_each_object(node, predicate, |o| {
            if n >= cap {
                return false;
            }
            out[n] = o;
            n += 1;
            true
        });
        n
    }

    /// Invoke `visit` for every object `node` has along `predicate`,
    /// ascending, stopping early as soon as `visit` returns `false`.
    ///
    /// Unlike [`TripleStore::objects_of`], this is not bounded by a
    /// caller-supplied buffer: every object is visited unless `visit`
    /// itself chooses to stop, so a node with more objects than any fixed
    /// probe width can't cause later objects to go unchecked.
    pub fn for_each_object(&self, node: Term, predicate: Term, mut visit: impl FnMut(Term) -> bool) {
        if node >= self.max_subjects || predicate >= self.max_predicates {
            return;
        }
        let row_start = predicate as usize * self.block_words + node as usize * self.row_words;
        let blocks = self.arena.get(self.blocks);
        for w in 0..self.row_words {
            let mut word = blocks[row_start + w];
            while word != 0 {
                let bit = word.trailing_zeros();
                let o = (w * 64) as u32 + bit;
                if !visit(o) {
                    return;
                }
                word &= word - 1;
            }
        }
    }
}
