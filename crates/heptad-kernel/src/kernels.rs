//! The five SIMD kernels the query plan executor composes into op tapes.
//!
//! Each kernel has exactly one scalar implementation and, where the target
//! architecture supports it, one SIMD implementation; dispatch between them
//! happens once per process via [`crate::cpu_dispatch::CpuFeatures`], not on
//! every call. All paths are required to produce bit-identical results —
//! the scalar path is canonical and used for differential testing.

use heptad_store::{Term, TripleStore};

/// One output row of a query plan.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Row {
    pub subject_id: Term,
    pub predicate_id: Term,
    pub object_id: Term,
    pub value: f32,
}

/// `scan_by_type(T)`: subjects with `(s, rdf_type_predicate, T)`, ascending.
pub fn scan_by_type(
    store: &TripleStore,
    rdf_type_predicate: Term,
    type_id: Term,
    out: &mut [Term],
) -> usize {
    store.scan_by_type(rdf_type_predicate, type_id, out)
}

/// `scan_by_predicate(p)`: subjects with any outgoing edge via `p`, ascending.
pub fn scan_by_predicate(store: &TripleStore, predicate_id: Term, out: &mut [Term]) -> usize {
    store.scan_by_predicate(predicate_id, out)
}

/// Open-addressed hash join. Builds a probe table over `left`, then emits
/// each element of `right` that is present in `left`, in `right`'s order
/// (with `right`'s multiplicity — a value appearing twice in `right` and
/// once in `left` is emitted twice).
///
/// `table_capacity` must be a power of two and `left.len()` should not
/// exceed roughly 70% of it to keep probe chains short. Every probe loop is
/// bounded by `table_capacity` regardless: a `left` whose distinct-value
/// count reaches or exceeds `table_capacity` abandons further inserts
/// rather than looping forever with a full table, and a `right` probe gives
/// up after a full lap rather than cycling indefinitely. This makes the
/// kernel total over its inputs, at the cost of dropping matches for
/// values that don't fit a table the caller undersized.
pub fn hash_join(left: &[Term], right: &[Term], table_capacity: usize, out: &mut [Term]) -> usize {
    debug_assert!(table_capacity.is_power_of_two());
    let mask = (table_capacity - 1) as u64;
    // 0 is a valid term id, so EMPTY is encoded out-of-band via a parallel
    // occupancy table rather than a sentinel value.
    let mut slots = vec![0u32; table_capacity];
    let mut occupied = vec![false; table_capacity];

    for &v in left {
        let mut idx = (hash_u32(v) & mask) as usize;
        for _probe in 0..table_capacity {
            if !occupied[idx] {
                slots[idx] = v;
                occupied[idx] = true;
                break;
            }
            if slots[idx] == v {
                break;
            }
            idx = (idx + 1) & mask as usize;
        }
    }

    let mut n = 0usize;
    for &v in right {
        if n >= out.len() {
            break;
        }
        let mut idx = (hash_u32(v) & mask) as usize;
        for _probe in 0..table_capacity {
            if !occupied[idx] {
                break;
            }
            if slots[idx] == v {
                out[n] = v;
                n += 1;
                break;
            }
            idx = (idx + 1) & mask as usize;
        }
    }
    n
}

#[inline]
fn hash_u32(x: u32) -> u64 {
    // xorshift-style mix, fixed and deterministic across runs.
    let mut h = x as u64;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Indices `i` with `values[i] > threshold`, ascending, stable.
pub fn filter_gt_f32(values: &[f32], threshold: f32, out: &mut [u32]) -> usize {
    use crate::cpu_dispatch::CpuFeatures;

    #[cfg(target_arch = "x86_64")]
    {
        if CpuFeatures::get().has_avx2 {
            return unsafe { filter_gt_f32_avx2(values, threshold, out) };
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        if CpuFeatures::get().has_neon {
            return unsafe { filter_gt_f32_neon(values, threshold, out) };
        }
    }
    filter_gt_f32_scalar(values, threshold, out)
}

fn filter_gt_f32_scalar(values: &[f32], threshold: f32, out: &mut [u32]) -> usize {
    let mut n = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if n >= out.len() {
            break;
        }
        if v > threshold {
            out[n] = i as u32;
            n += 1;
        }
    }
    n
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn filter_gt_f32_avx2(values: &[f32], threshold: f32, out: &mut [u32]) -> usize {
    use std::arch::x86_64::*;

    let mut n = 0usize;
    let cap = out.len();
    let thresh = _mm256_set1_ps(threshold);
    let chunks = values.chunks_exact(8);
    let remainder = chunks.remainder();
    let mut base = 0usize;

    for chunk in chunks {
        if n >= cap {
            return n;
        }
        let v = _mm256_loadu_ps(chunk.as_ptr());
        let cmp = _mm256_cmp_ps(v, thresh, _CMP_GT_OQ);
        let mask = _mm256_movemask_ps(cmp) as u32;
        for lane in 0..8u32 {
            if n >= cap {
                return n;
            }
            if (mask >> lane) & 1 != 0 {
                out[n] = base as u32 + lane;
                n += 1;
            }
        }
        base += 8;
    }

    for (i, &v) in remainder.iter().enumerate() {
        if n >= cap {
            break;
        }
        if v > threshold {
            out[n] = (base + i) as u32;
            n += 1;
        }
    }
    n
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn filter_gt_f32_neon(values: &[f32], threshold: f32, out: &mut [u32]) -> usize {
    use std::arch::aarch64::*;

    let mut n = 0usize;
    let cap = out.len();
    let thresh = vdupq_n_f32(threshold);
    let chunks = values.chunks_exact(4);
    let remainder = chunks.remainder();
    let mut base = 0usize;

    for chunk in chunks {
        if n >= cap {
            return n;
        }
        let v = vld1q_f32(chunk.as_ptr());
        let cmp = vcgtq_f32(v, thresh);
        let mask_lanes: [u32; 4] = std::mem::transmute(cmp);
        for lane in 0..4u32 {
            if n >= cap {
                return n;
            }
            if mask_lanes[lane as usize] != 0 {
                out[n] = base as u32 + lane;
                n += 1;
            }
        }
        base += 4;
    }

    for (i, &v) in remainder.iter().enumerate() {
        if n >= cap {
            break;
        }
        if v > threshold {
            out[n] = (base + i) as u32;
            n += 1;
        }
    }
    n
}

/// Write `subject_id` for each id in `ids` into successive output rows.
/// Predicate/object/value fields are left at their default and are filled
/// in afterward by the query plan when the plan carries literal or joined
/// column data.
pub fn project(ids: &[Term], out: &mut [Row]) -> usize {
    let n = ids.len().min(out.len());
    for i in 0..n {
        out[i] = Row {
            subject_id: ids[i],
            ..Row::default()
        };
    }
    n
}
