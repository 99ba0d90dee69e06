//! End-to-end micro-benchmark through the public `Engine` handle, observed
//! against the composite-operation cycle budget (not asserted — no
//! toolchain run is part of this exercise).

use criterion::{criterion_group, criterion_main, Criterion};
use heptad_engine::{Constraint, Engine, HarnessConfig};

const RDF_TYPE: u32 = 0;
const HAS_EMAIL: u32 = 1;
const WORKS_AT: u32 = 2;
const PERSON: u32 = 10;
const COMPANY: u32 = 11;
const PERSON_SHAPE: u32 = 1;

fn seeded_engine() -> Engine {
    let mut engine = Engine::create(HarnessConfig {
        max_subjects: 64,
        max_predicates: 8,
        max_objects: 512,
        rdf_type_predicate: RDF_TYPE,
        ..HarnessConfig::default()
    });
    engine.add_triple(1, RDF_TYPE, PERSON).unwrap();
    engine.add_triple(1, HAS_EMAIL, 100).unwrap();
    engine.add_triple(1, WORKS_AT, 4).unwrap();
    engine.add_triple(4, RDF_TYPE, COMPANY).unwrap();
    engine.shape_register(PERSON_SHAPE, PERSON).unwrap();
    engine
        .constraint_add(PERSON_SHAPE, Constraint::min_count(HAS_EMAIL, 1))
        .unwrap();
    engine
        .constraint_add(PERSON_SHAPE, Constraint::class(WORKS_AT, COMPANY))
        .unwrap();
    engine
}

fn bench_validate_through_engine(c: &mut Criterion) {
    let mut engine = seeded_engine();
    c.bench_function("engine_validate_person_shape", |b| {
        b.iter(|| engine.validate(PERSON_SHAPE, 1, None).unwrap());
    });
}

criterion_group!(benches, bench_validate_through_engine);
criterion_main!(benches);
