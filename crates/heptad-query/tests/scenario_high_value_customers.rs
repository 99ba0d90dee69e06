//! End-to-end test for the `getHighValueCustomers` plan against a real
//! `TripleStore` — no mocks, state-based assertions only.

use heptad_query::{Executor, QueryPlan, Row};
use heptad_store::TripleStore;

const RDF_TYPE: u32 = 0;
const CUSTOMER: u32 = 1;
const HAS_NAME: u32 = 2;
const LIFETIME_VALUE: u32 = 3;

fn seeded_store() -> TripleStore {
    let mut store = TripleStore::new(2048, 8, 20_000);
    for i in 0..10u32 {
        let subject = 1000 + i;
        store.add_triple(subject, RDF_TYPE, CUSTOMER).unwrap();
        store.add_triple(subject, HAS_NAME, 9000 + i).unwrap();
        let value = [2000u32, 4000, 6000, 8000, 10000][i as usize % 5];
        store.add_triple(subject, LIFETIME_VALUE, value).unwrap();
    }
    store
}

#[test]
fn high_value_customers_match_expected_cardinality_and_order() {
    let store = seeded_store();
    let mut executor = Executor::new(RDF_TYPE);
    executor.register_plan(
        "getHighValueCustomers",
        QueryPlan::builder()
            .scan_by_type(CUSTOMER, 0)
            .scan_by_predicate(HAS_NAME, 1)
            .hash_join(0, 1, 2)
            .load_value_f32(LIFETIME_VALUE, 2, 3)
            .filter_gt_f32(3, 5000.0, 4)
            .build(),
    );

    let mut out = [Row::default(); 32];
    let n = executor
        .execute(&store, "getHighValueCustomers", &mut out, 32)
        .expect("plan execution");

    // v > 5000 over the cycling {2000,4000,6000,8000,10000} pattern: 3 of
    // every 5 subjects qualify, so 6 of the 10 seeded customers.
    assert_eq!(n, 6);
    let subjects: Vec<u32> = out[..n].iter().map(|r| r.subject_id).collect();
    let mut sorted = subjects.clone();
    sorted.sort_unstable();
    assert_eq!(subjects, sorted, "results must be ascending by subject id");
    for row in &out[..n] {
        assert!(row.value > 5000.0);
        assert_eq!(row.predicate_id, LIFETIME_VALUE);
    }
}
