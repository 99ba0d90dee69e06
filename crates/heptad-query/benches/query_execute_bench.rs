//! Micro-benchmarks for named plan execution, observed against the
//! composite-operation cycle budget (not asserted — no toolchain run is
//! part of this exercise).

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use heptad_query::{Executor, QueryPlan, Row};
use heptad_store::TripleStore;

const RDF_TYPE: u32 = 0;
const CUSTOMER: u32 = 1;
const HAS_NAME: u32 = 2;
const LIFETIME_VALUE: u32 = 3;

fn seeded_store(n: u32) -> TripleStore {
    let mut store = TripleStore::new(n + 2000, 8, 20_000);
    for i in 0..n {
        let subject = 1000 + i;
        store.add_triple(subject, RDF_TYPE, CUSTOMER).unwrap();
        store.add_triple(subject, HAS_NAME, 9000 + i).unwrap();
        let value = [2000u32, 4000, 6000, 8000, 10000][i as usize % 5];
        store.add_triple(subject, LIFETIME_VALUE, value).unwrap();
    }
    store
}

fn bench_get_high_value_customers(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_high_value_customers");
    for size in [16u32, 256, 4096] {
        let store = seeded_store(size);
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
        let mut out = vec![Row::default(); size as usize];

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                executor
                    .execute(&store, "getHighValueCustomers", &mut out, out.len())
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_get_high_value_customers);
criterion_main!(benches);
