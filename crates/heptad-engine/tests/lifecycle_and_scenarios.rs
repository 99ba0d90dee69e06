//! End-to-end tests driving the public lifecycle, query, and validation
//! API against a real engine instance — no mocks.

use heptad_engine::{Constraint, Engine, HarnessConfig, Row};

const RDF_TYPE: u32 = 0;
const CUSTOMER: u32 = 1;
const HAS_NAME: u32 = 2;
const LIFETIME_VALUE: u32 = 3;
const HAS_EMAIL: u32 = 4;
const PHONE_NUMBER: u32 = 5;
const WORKS_AT: u32 = 6;
const PERSON: u32 = 10;
const COMPANY: u32 = 11;
const PERSON_SHAPE: u32 = 1;

fn engine() -> Engine {
    Engine::create(HarnessConfig {
        max_subjects: 2048,
        max_predicates: 8,
        max_objects: 20_000,
        rdf_type_predicate: RDF_TYPE,
        ..HarnessConfig::default()
    })
}

#[test]
fn scenario_e_high_value_customers_through_the_engine() {
    let mut engine = engine();
    for i in 0..10u32 {
        let subject = 1000 + i;
        engine.add_triple(subject, RDF_TYPE, CUSTOMER).unwrap();
        engine.add_triple(subject, HAS_NAME, 9000 + i).unwrap();
        let value = [2000u32, 4000, 6000, 8000, 10000][i as usize % 5];
        engine.add_triple(subject, LIFETIME_VALUE, value).unwrap();
    }
    engine.register_plan(
        "getHighValueCustomers",
        heptad_engine::QueryPlan::builder()
            .scan_by_type(CUSTOMER, 0)
            .scan_by_predicate(HAS_NAME, 1)
            .hash_join(0, 1, 2)
            .load_value_f32(LIFETIME_VALUE, 2, 3)
            .filter_gt_f32(3, 5000.0, 4)
            .build(),
    );

    let mut out = [Row::default(); 16];
    let n = engine
        .query_execute("getHighValueCustomers", &mut out, 16)
        .unwrap();
    assert_eq!(n, 6);
}

fn register_person_shape(engine: &mut Engine) {
    engine.shape_register(PERSON_SHAPE, PERSON).unwrap();
    engine
        .constraint_add(PERSON_SHAPE, Constraint::min_count(HAS_EMAIL, 1))
        .unwrap();
    engine
        .constraint_add(PERSON_SHAPE, Constraint::max_count(HAS_EMAIL, 5))
        .unwrap();
    engine
        .constraint_add(PERSON_SHAPE, Constraint::class(WORKS_AT, COMPANY))
        .unwrap();
}

#[test]
fn scenario_a_valid_person_conforms_through_the_engine() {
    let mut engine = engine();
    engine.add_triple(1, RDF_TYPE, PERSON).unwrap();
    engine.add_triple(1, HAS_EMAIL, 100).unwrap();
    engine.add_triple(1, PHONE_NUMBER, 101).unwrap();
    engine.add_triple(1, WORKS_AT, 4).unwrap();
    engine.add_triple(4, RDF_TYPE, COMPANY).unwrap();
    register_person_shape(&mut engine);

    assert!(engine.validate(PERSON_SHAPE, 1, None).unwrap());
}

#[test]
fn scenario_b_missing_email_does_not_conform_through_the_engine() {
    let mut engine = engine();
    engine.add_triple(2, RDF_TYPE, PERSON).unwrap();
    engine.add_triple(2, PHONE_NUMBER, 102).unwrap();
    register_person_shape(&mut engine);

    assert!(!engine.validate(PERSON_SHAPE, 2, None).unwrap());
}

#[test]
fn cache_invalidation_survives_mutation_between_validations() {
    let mut engine = engine();
    engine.add_triple(2, RDF_TYPE, PERSON).unwrap();
    register_person_shape(&mut engine);
    assert!(!engine.validate(PERSON_SHAPE, 2, None).unwrap());

    engine.add_triple(2, HAS_EMAIL, 500).unwrap();
    assert!(engine.validate(PERSON_SHAPE, 2, None).unwrap());
}

#[test]
fn destroy_releases_the_handle() {
    let engine = engine();
    engine.destroy();
}
