#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! Bump-pointer arena allocator with cache-line-aligned sub-regions.
//!
//! The arena hands out typed slices whose lifetime is bound to a shared
//! borrow of the arena itself. `reset` and `destroy` both require an
//! exclusive borrow, so the borrow checker statically rejects any attempt
//! to use a previously allocated slice after either call — no generation
//! counters or runtime validity checks are needed.

use std::cell::Cell;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use thiserror::Error;

/// Default alignment applied when a caller doesn't request a wider one.
pub const CACHE_LINE: usize = 64;

/// Errors raised by arena operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArenaError {
    #[error("arena capacity exceeded: requested {requested} bytes, {available} available")]
    Capacity { requested: usize, available: usize },
    #[error("invalid allocation argument: {0}")]
    InvalidArg(&'static str),
}

bitflags::bitflags! {
    /// Construction-time behaviour flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ArenaFlags: u32 {
        /// Zero every byte handed out by `alloc`, not just on construction.
        const ZERO_ON_ALLOC = 0b0000_0001;
    }
}

/// A stable, `Copy` handle into an arena-owned region.
///
/// Carries no lifetime: resolving it into a slice via [`Arena::get`]/
/// [`Arena::get_mut`] borrows the arena for exactly as long as the
/// returned slice is used. This lets a handle live as a plain field
/// alongside the `Arena` that produced it (see [`Arena::alloc_handle`]).
pub struct ArenaHandle<T> {
    offset: usize,
    len: usize,
    _marker: PhantomData<T>,
}

// Manual impls: `#[derive(Clone, Copy, Debug)]` would add a `T: Clone` /
// `T: Copy` / `T: Debug` bound via `PhantomData<T>`, but a handle is a
// plain offset/length pair regardless of what `T` is.
impl<T> Clone for ArenaHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaHandle<T> {}

impl<T> std::fmt::Debug for ArenaHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaHandle")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

/// A fixed-capacity, bump-allocated memory region.
///
/// Not `Sync`: callers must serialize access to one arena themselves, per
/// the single-threaded-per-engine concurrency model this allocator backs.
pub struct Arena {
    storage: Box<[u8]>,
    cursor: Cell<usize>,
    flags: ArenaFlags,
}

impl Arena {
    /// Reserve `capacity` contiguous bytes.
    pub fn create(capacity: usize, flags: ArenaFlags) -> Self {
        tracing::debug!(capacity, ?flags, "arena created");
        let storage = vec![0u8; capacity].into_boxed_slice();
        Self {
            storage,
            cursor: Cell::new(0),
            flags,
        }
    }

    /// Bump the cursor past `bytes` aligned to `align`, returning the
    /// storage-relative offset of the reserved region. Shared by every
    /// `alloc*` entry point below.
    fn reserve(&self, bytes: usize, align: usize) -> Result<usize, ArenaError> {
        if align == 0 || !align.is_power_of_two() {
            return Err(ArenaError::InvalidArg("alignment must be a power of two"));
        }
        let base = self.storage.as_ptr() as usize;
        let cursor = self.cursor.get();
        let current = base + cursor;
        let aligned = (current + align - 1) & !(align - 1);
        let pad = aligned - current;
        let start = cursor + pad;
        let end = start
            .checked_add(bytes)
            .ok_or(ArenaError::InvalidArg("allocation size overflow"))?;

        if end > self.storage.len() {
            return Err(ArenaError::Capacity {
                requested: bytes,
                available: self.storage.len() - cursor.min(self.storage.len()),
            });
        }

        self.cursor.set(end);
        Ok(start)
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Bytes consumed since the last `reset`.
    pub fn used(&self) -> usize {
        self.cursor.get()
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Allocate `count` cache-line-aligned, zero-initialized `T`s.
    ///
    /// The alignment used is `max(align_of::<T>(), CACHE_LINE)`, matching
    /// the store and validator layouts that rely on predicate blocks and
    /// cache entries starting on 64-byte boundaries.
    pub fn alloc<T>(&self, count: usize) -> Result<&mut [T], ArenaError> {
        if count == 0 {
            return Ok(&mut []);
        }
        let align = align_of::<T>().max(CACHE_LINE);
        let bytes = count
            .checked_mul(size_of::<T>())
            .ok_or(ArenaError::InvalidArg("allocation size overflow"))?;
        let raw = self.alloc_bytes(bytes, align)?;
        // SAFETY: `raw` is exactly `bytes` long, newly carved out of the
        // arena's backing storage by bump-pointer advance above (never
        // revisited until `reset`), aligned to `align_of::<T>()` by
        // `alloc_bytes`, and zero-initialized when freshly backed by the
        // zero-filled `storage` vec or by the ZERO_ON_ALLOC path below —
        // so `T`'s bit pattern of all zero bytes must be valid for every
        // `T` this is instantiated with (true for the plain-old-data
        // numeric/struct types this arena backs: triples, bitmap words,
        // cache entries).
        let ptr = raw.as_mut_ptr() as *mut T;
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr, count) })
    }

    /// Allocate `bytes` raw bytes aligned to `align` (must be a power of two).
    pub fn alloc_bytes(&self, bytes: usize, align: usize) -> Result<&mut [u8], ArenaError> {
        let start = self.reserve(bytes, align)?;
        // SAFETY: `[start, start+bytes)` lies within `storage` (`reserve`
        // checked this) and was never returned by a prior `alloc*` call
        // since the cursor only ever advances, so this slice does not
        // alias any live reference previously handed out by this arena.
        let ptr = unsafe { (self.storage.as_ptr() as *mut u8).add(start) };
        let slice = unsafe { std::slice::from_raw_parts_mut(ptr, bytes) };
        if self.flags.contains(ArenaFlags::ZERO_ON_ALLOC) {
            slice.fill(0);
        }
        Ok(slice)
    }

    /// Allocate `count` cache-line-aligned `T`s, returning a reusable
    /// handle rather than a borrowed slice.
    ///
    /// A slice returned by `alloc` borrows `self`, which is exactly right
    /// for allocate-then-use-once callers but makes an allocation
    /// impossible to store alongside the arena that owns it in the same
    /// struct (the arena and a slice borrowed from it can't be sibling
    /// fields without the struct borrowing from itself). A handle carries
    /// no lifetime — it's a plain `Copy` offset/length pair — so it can sit
    /// next to the `Arena` as an ordinary field and be resolved back into a
    /// slice on demand via [`Arena::get`]/[`Arena::get_mut`], each borrow
    /// scoped to just the call that needs it.
    pub fn alloc_handle<T>(&self, count: usize) -> Result<ArenaHandle<T>, ArenaError> {
        if count == 0 {
            return Ok(ArenaHandle {
                offset: 0,
                len: 0,
                _marker: PhantomData,
            });
        }
        let align = align_of::<T>().max(CACHE_LINE);
        let bytes = count
            .checked_mul(size_of::<T>())
            .ok_or(ArenaError::InvalidArg("allocation size overflow"))?;
        let offset = self.reserve(bytes, align)?;
        if self.flags.contains(ArenaFlags::ZERO_ON_ALLOC) {
            // SAFETY: `[offset, offset+bytes)` was just reserved above and
            // is disjoint from every region handed out before it.
            let ptr = unsafe { (self.storage.as_ptr() as *mut u8).add(offset) };
            unsafe { std::slice::from_raw_parts_mut(ptr, bytes) }.fill(0);
        }
        Ok(ArenaHandle {
            offset,
            len: count,
            _marker: PhantomData,
        })
    }

    /// Resolve a handle produced by [`Arena::alloc_handle`] into a shared view.
    pub fn get<T>(&self, handle: ArenaHandle<T>) -> &[T] {
        if handle.len == 0 {
            return &[];
        }
        // SAFETY: `handle` was produced by `alloc_handle::<T>` against this
        // same arena. The arena's backing storage is a `Box<[u8]>` that is
        // never reallocated or moved after `create`, so the byte range
        // `[offset, offset + len * size_of::<T>())` stays in-bounds and
        // holds a valid bit pattern for `T` (zero-initialized at creation
        // or by `alloc_handle`, or previously written through `get_mut`).
        let ptr = unsafe { self.storage.as_ptr().add(handle.offset) as *const T };
        unsafe { std::slice::from_raw_parts(ptr, handle.len) }
    }

    /// Resolve a handle produced by [`Arena::alloc_handle`] into an exclusive view.
    ///
    /// Takes `&self`, not `&mut self`, matching `alloc`/`alloc_bytes`:
    /// callers serialize access to one arena themselves per the
    /// single-threaded-per-engine model this allocator backs.
    pub fn get_mut<T>(&self, handle: ArenaHandle<T>) -> &mut [T] {
        if handle.len == 0 {
            return &mut [];
        }
        // SAFETY: see `get`.
        let ptr = unsafe { (self.storage.as_ptr() as *mut u8).add(handle.offset) as *mut T };
        unsafe { std::slice::from_raw_parts_mut(ptr, handle.len) }
    }

    /// Rewind the cursor to the start of the region.
    ///
    /// Takes `&mut self`: the borrow checker rejects this call while any
    /// slice from a prior `alloc`/`alloc_bytes` is still borrowed.
    pub fn reset(&mut self) {
        self.cursor.set(0);
    }

    /// Consume and release the region.
    pub fn destroy(self) {
        tracing::debug!(capacity = self.capacity(), "arena destroyed");
        drop(self);
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Every sequence of in-capacity allocations must land on a
        // cache-line-aligned address, whatever size is requested.
        #[test]
        fn prop_alloc_bytes_is_always_cache_line_aligned(sizes in prop::collection::vec(1usize..200, 0..20)) {
            let arena = Arena::create(1 << 16, ArenaFlags::empty());
            for size in sizes {
                if let Ok(region) = arena.alloc_bytes(size, CACHE_LINE) {
                    prop_assert_eq!(region.as_ptr() as usize % CACHE_LINE, 0);
                }
            }
        }

        // reset() always returns the cursor to zero, regardless of how much
        // was allocated beforehand.
        #[test]
        fn prop_reset_always_returns_cursor_to_zero(alloc_bytes_len in 0usize..4096) {
            let mut arena = Arena::create(4096, ArenaFlags::empty());
            let _ = arena.alloc_bytes(alloc_bytes_len, CACHE_LINE);
            arena.reset();
            prop_assert_eq!(arena.used(), 0);
        }
    }
}
