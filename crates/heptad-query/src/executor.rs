//! Dispatches named plans to their op tape and writes the caller's result buffer.

use rustc_hash::FxHashMap;
use thiserror::Error;

use heptad_kernel::{filter_gt_f32, hash_join, project, scan_by_predicate, scan_by_type};
use heptad_store::{Term, TripleStore};
use heptad_timer::{ScopedTickMeasurement, TickBudget, PRIMITIVE_CEILING};

use crate::plan::{Op, QueryPlan, RegisterBank, Row, S7T_SQL_MAX_ROWS};

/// Errors raised by plan registration and execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QueryError {
    #[error("no query plan registered under name {0:?}")]
    NotFound(String),
    #[error("result buffer capacity {cap} exceeded (plan produced {produced} rows)")]
    Capacity { cap: usize, produced: usize },
}

/// Executes named AOT query plans against a [`TripleStore`].
///
/// `rdf_type_predicate` is the predicate id the store uses for `rdf:type`
/// edges; it is fixed at construction because every `scan_by_type` op in
/// every plan this executor runs shares the same predicate.
pub struct Executor {
    plans: FxHashMap<String, QueryPlan>,
    rdf_type_predicate: Term,
}

impl Executor {
    pub fn new(rdf_type_predicate: Term) -> Self {
        Self {
            plans: FxHashMap::default(),
            rdf_type_predicate,
        }
    }

    /// Register a plan under `name`, standing in for the offline generator's
    /// header-file emission. Re-registering a name overwrites the prior plan.
    pub fn register_plan(&mut self, name: impl Into<String>, plan: QueryPlan) {
        let name = name.into();
        tracing::info!(plan = %name, "query plan registered");
        self.plans.insert(name, plan);
    }

    /// Execute `plan_name` against `store`, writing up to `max_results` rows
    /// into `out`. Returns the number of rows written.
    pub fn execute(
        &self,
        store: &TripleStore,
        plan_name: &str,
        out: &mut [Row],
        max_results: usize,
    ) -> Result<usize, QueryError> {
        let plan = self
            .plans
            .get(plan_name)
            .ok_or_else(|| QueryError::NotFound(plan_name.to_string()))?;

        let mut bank = RegisterBank::new();
        let mut scratch_ids = [0u32; S7T_SQL_MAX_ROWS];
        let mut scratch_idx = [0u32; S7T_SQL_MAX_ROWS];
        let mut scratch_vals = [0.0f32; S7T_SQL_MAX_ROWS];
        // Each op is charged individually against the primitive ceiling;
        // a per-op overrun is reported via `tracing::warn!` on drop, not
        // propagated as an error (§4.2: ceilings are telemetry gates).
        let mut budget = TickBudget::with_ceiling(PRIMITIVE_CEILING);

        let mut last_out = 0usize;
        for op in &plan.ops {
            last_out = op.out_register();
            let _tick = ScopedTickMeasurement::new(&mut budget, op.kernel_name());
            match *op {
                Op::ScanByType { type_id, out: out_reg } => {
                    let n = scan_by_type(store, self.rdf_type_predicate, type_id, &mut scratch_ids);
                    bank.write_ids(out_reg, &scratch_ids[..n]);
                }
                Op::ScanByPredicate {
                    predicate_id,
                    out: out_reg,
                } => {
                    let n = scan_by_predicate(store, predicate_id, &mut scratch_ids);
                    bank.write_ids(out_reg, &scratch_ids[..n]);
                }
                Op::HashJoin { left, right, out: out_reg } => {
                    let left_ids = bank.get(left).ids().to_vec();
                    let right_ids = bank.get(right).ids().to_vec();
                    // Sized to the actual scan, not a fixed guess: a plan
                    // whose first scan yields thousands of distinct subjects
                    // (a type with many instances is perfectly valid input)
                    // must not overrun a hardcoded table capacity. Doubling
                    // keeps the load factor the kernel documents (`L <=
                    // table_capacity * load_factor`) comfortably under 50%.
                    let table_capacity = (left_ids.len().max(1) * 2).next_power_of_two().max(1024);
                    let n = hash_join(&left_ids, &right_ids, table_capacity, &mut scratch_ids);
                    bank.write_ids(out_reg, &scratch_ids[..n]);
                }
                Op::LoadValueF32 {
                    predicate_id,
                    src,
                    out: out_reg,
                } => {
                    let ids = bank.get(src).ids().to_vec();
                    let mut one = [0u32; 1];
                    for (i, &id) in ids.iter().enumerate() {
                        let got = store.objects_of(id, predicate_id, &mut one);
                        scratch_vals[i] = if got > 0 { one[0] as f32 } else { 0.0 };
                    }
                    bank.write_rows(out_reg, &ids, &scratch_vals[..ids.len()]);
                }
                Op::FilterGtF32 { src, threshold, out: out_reg } => {
                    let values = bank.get(src).values().to_vec();
                    let ids = bank.get(src).ids().to_vec();
                    let n = filter_gt_f32(&values, threshold, &mut scratch_idx);
                    let filtered_ids: Vec<Term> =
                        scratch_idx[..n].iter().map(|&i| ids[i as usize]).collect();
                    let filtered_vals: Vec<f32> =
                        scratch_idx[..n].iter().map(|&i| values[i as usize]).collect();
                    bank.write_rows(out_reg, &filtered_ids, &filtered_vals);
                }
            }
        }

        let final_reg = bank.get(last_out);
        let produced = final_reg.len();
        let cap = out.len().min(max_results);
        let mut rows = vec![Row::default(); cap];
        let n = project(final_reg.ids(), &mut rows);
        for i in 0..n {
            out[i] = rows[i];
            out[i].predicate_id = plan.result_predicate;
            if i < final_reg.values().len() {
                out[i].value = final_reg.values()[i];
            }
        }
        if produced > cap {
            return Err(QueryError::Capacity { cap, produced });
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heptad_store::TripleStore;

    const RDF_TYPE: Term = 0;
    const CUSTOMER: Term = 1;
    const HAS_NAME: Term = 2;
    const LIFETIME_VALUE: Term = 3;

    fn seeded_store() -> TripleStore {
        let mut store = TripleStore::new(1024, 8, 20_000);
        for i in 0..10u32 {
            let subject = 1000 + i;
            store.add_triple(subject, RDF_TYPE, CUSTOMER).unwrap();
            store.add_triple(subject, HAS_NAME, 9000 + i).unwrap();
            let value = [2000u32, 4000, 6000, 8000, 10000][i as usize % 5];
            store.add_triple(subject, LIFETIME_VALUE, value).unwrap();
        }
        store
    }

    fn high_value_plan() -> QueryPlan {
        QueryPlan::builder()
            .scan_by_type(CUSTOMER, 0)
            .scan_by_predicate(HAS_NAME, 1)
            .hash_join(0, 1, 2)
            .load_value_f32(LIFETIME_VALUE, 2, 3)
            .filter_gt_f32(3, 5000.0, 4)
            .build()
    }

    #[test]
    fn unknown_plan_name_is_not_found() {
        let executor = Executor::new(RDF_TYPE);
        let store = seeded_store();
        let mut out = [Row::default(); 16];
        let err = executor
            .execute(&store, "missing", &mut out, 16)
            .unwrap_err();
        assert!(matches!(err, QueryError::NotFound(_)));
    }

    #[test]
    fn scenario_e_high_value_customers() {
        let mut executor = Executor::new(RDF_TYPE);
        executor.register_plan("getHighValueCustomers", high_value_plan());
        let store = seeded_store();
        let mut out = [Row::default(); 16];
        let n = executor
            .execute(&store, "getHighValueCustomers", &mut out, 16)
            .unwrap();
        // values cycle 2000,4000,6000,8000,10000 over 10 subjects: 6 exceed 5000
        assert_eq!(n, 6);
        for w in out[..n].windows(2) {
            assert!(w[0].subject_id < w[1].subject_id);
        }
        for row in &out[..n] {
            assert!(row.value > 5000.0);
        }
    }

    #[test]
    fn empty_store_scan_yields_zero_rows() {
        let mut executor = Executor::new(RDF_TYPE);
        executor.register_plan(
            "anyType",
            QueryPlan::builder().scan_by_type(CUSTOMER, 0).build(),
        );
        let store = TripleStore::new(16, 4, 16);
        let mut out = [Row::default(); 4];
        let n = executor.execute(&store, "anyType", &mut out, 4).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn undersized_buffer_reports_capacity_with_partial_rows() {
        let mut executor = Executor::new(RDF_TYPE);
        executor.register_plan(
            "allCustomers",
            QueryPlan::builder().scan_by_type(CUSTOMER, 0).build(),
        );
        let store = seeded_store();
        let mut out = [Row::default(); 3];
        let err = executor
            .execute(&store, "allCustomers", &mut out, 3)
            .unwrap_err();
        assert!(matches!(err, QueryError::Capacity { cap: 3, produced: 10 }));
        // the first `cap` rows are still valid and ascending.
        assert_eq!(out[0].subject_id, 1000);
        assert_eq!(out[2].subject_id, 1002);
    }

    #[test]
    fn zero_kernel_result_short_circuits_join() {
        let mut executor = Executor::new(RDF_TYPE);
        executor.register_plan(
            "joinWithNoMatches",
            QueryPlan::builder()
                .scan_by_type(999, 0) // no subjects of this type
                .scan_by_predicate(HAS_NAME, 1)
                .hash_join(0, 1, 2)
                .build(),
        );
        let store = seeded_store();
        let mut out = [Row::default(); 16];
        let n = executor
            .execute(&store, "joinWithNoMatches", &mut out, 16)
            .unwrap();
        assert_eq!(n, 0);
    }

    /// Regression test: a scan yielding more distinct subjects than a
    /// hardcoded 1024-slot probe table used to overrun the table and spin
    /// in the kernel's build loop. A type with 2000 instances is valid
    /// input, not an edge case.
    #[test]
    fn hash_join_handles_scans_past_a_thousand_distinct_subjects() {
        const BIG_CUSTOMER: Term = 5;
        let mut store = TripleStore::new(4096, 8, 20_000);
        for i in 0..2000u32 {
            store.add_triple(i, RDF_TYPE, BIG_CUSTOMER).unwrap();
            store.add_triple(i, HAS_NAME, 10_000 + i).unwrap();
        }
        let mut executor = Executor::new(RDF_TYPE);
        executor.register_plan(
            "bigJoin",
            QueryPlan::builder()
                .scan_by_type(BIG_CUSTOMER, 0)
                .scan_by_predicate(HAS_NAME, 1)
                .hash_join(0, 1, 2)
                .build(),
        );
        let mut out = vec![Row::default(); S7T_SQL_MAX_ROWS];
        let n = executor
            .execute(&store, "bigJoin", &mut out, S7T_SQL_MAX_ROWS)
            .unwrap();
        assert_eq!(n, 2000);
    }

}
