//! The `Engine`: one handle wiring together the arena-backed triple store,
//! query executor, and constraint validator behind the lifecycle API of
//! §6 of this workspace's design document.

use heptad_query::{Executor, QueryPlan, Row};
use heptad_store::{Dictionary, NodeKind, RangeHint, Term, TermEntry, TripleStore};
use heptad_telemetry::{traced_span, SpanRecorder};
use heptad_timer::{ScopedTickMeasurement, TickBudget};
use heptad_validate::{Constraint, Report, Shape, Validator};

use crate::config::HarnessConfig;
use crate::error::EngineError;

/// An in-process, single-threaded engine instance. Not `Send`/`Sync`: the
/// concurrency model is one engine per thread (§5), never shared access to
/// one engine from multiple threads.
///
/// There is no separate `Arena` field here: `store` owns the one arena
/// this engine allocates, sized to exactly the predicate-bitmap blocks its
/// dimensions require (§4.3). An engine-level arena with nothing allocated
/// from it would be dead weight duplicating that allocation, not backing it.
pub struct Engine {
    store: TripleStore,
    dictionary: Dictionary,
    executor: Executor,
    validator: Validator,
    budget: TickBudget,
    telemetry: SpanRecorder,
    config: HarnessConfig,
}

impl Engine {
    /// `engine_create`. Allocates every subsystem's backing storage up
    /// front; nothing here is lazy.
    pub fn create(config: HarnessConfig) -> Self {
        tracing::info!(
            max_subjects = config.max_subjects,
            max_predicates = config.max_predicates,
            max_objects = config.max_objects,
            "engine created"
        );
        Self {
            store: TripleStore::new(config.max_subjects, config.max_predicates, config.max_objects),
            dictionary: Dictionary::new(),
            executor: Executor::new(config.rdf_type_predicate),
            validator: Validator::new(config.rdf_type_predicate, config.property_count_cache_size),
            budget: TickBudget::with_ceiling(config.composite_ceiling),
            telemetry: SpanRecorder::new(),
            config,
        }
    }

    /// `engine_destroy`. Consumes the handle; the borrow checker makes any
    /// further use of it a compile error, so no runtime use-after-destroy
    /// check is needed. Every field, including the store's arena, is
    /// released by ordinary `Drop` glue on return.
    pub fn destroy(self) {
        tracing::info!("engine destroyed");
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Recorded spans from the optional telemetry layer. Empty whenever the
    /// `spans` feature of `heptad-telemetry` is off.
    pub fn telemetry_spans(&self) -> &[heptad_telemetry::Span] {
        self.telemetry.spans()
    }

    /// `engine_add_triple`. Eagerly invalidates the property-count cache:
    /// cache dirtiness is flagged before this call returns, per §6's
    /// ordering guarantee.
    pub fn add_triple(&mut self, s: Term, p: Term, o: Term) -> Result<(), EngineError> {
        self.store.add_triple(s, p, o)?;
        self.validator.invalidate();
        Ok(())
    }

    /// `engine_ask`.
    pub fn ask(&self, s: Term, p: Term, o: Term) -> bool {
        self.store.ask_pattern(s, p, o)
    }

    /// Registers term metadata with the engine's dictionary (node kind,
    /// datatype, range hint), standing in for the offline generator's
    /// dictionary load.
    pub fn register_term(&mut self, term_id: Term, node_kind: NodeKind, datatype: Option<u32>, range_hint: Option<RangeHint>) {
        self.dictionary.insert(
            term_id,
            TermEntry {
                node_kind,
                datatype,
                range_hint,
            },
        );
    }

    /// Standing in for the offline query-plan generator's header-file
    /// emission: registers a pre-built plan under `name`.
    pub fn register_plan(&mut self, name: impl Into<String>, plan: QueryPlan) {
        self.executor.register_plan(name, plan);
    }

    /// `query_execute`. Opens a span on entry and closes it on exit (C8),
    /// alongside the C2 tick-budget charge for the same call.
    pub fn query_execute(
        &mut self,
        plan_name: &str,
        out: &mut [Row],
        max_results: usize,
    ) -> Result<usize, EngineError> {
        let _guard = ScopedTickMeasurement::new(&mut self.budget, "query_execute");
        let executor = &self.executor;
        let store = &self.store;
        Ok(traced_span!(&mut self.telemetry, "query_execute", {
            executor.execute(store, plan_name, out, max_results)
        })?)
    }

    /// `shape_register`.
    pub fn shape_register(&mut self, shape_id: u32, target_class: Term) -> Result<(), EngineError> {
        if self.validator.shape(shape_id).is_some() {
            return Err(EngineError::AlreadyExists(shape_id));
        }
        tracing::info!(shape_id, target_class, "shape registered");
        self.validator.register_shape(shape_id, target_class);
        Ok(())
    }

    pub fn shape(&self, shape_id: u32) -> Option<&Shape> {
        self.validator.shape(shape_id)
    }

    /// `constraint_add`.
    pub fn constraint_add(&mut self, shape_id: u32, constraint: Constraint) -> Result<(), EngineError> {
        Ok(self.validator.add_constraint(shape_id, constraint)?)
    }

    /// `validate`. Opens a span on entry and closes it on exit (C8).
    pub fn validate(&mut self, shape_id: u32, node: Term, report: Option<&mut Report>) -> Result<bool, EngineError> {
        let _guard = ScopedTickMeasurement::new(&mut self.budget, "validate");
        let validator = &mut self.validator;
        let store = &self.store;
        let dictionary = &self.dictionary;
        Ok(traced_span!(&mut self.telemetry, "validate", {
            validator.validate(store, dictionary, shape_id, node, report)
        })?)
    }

    /// `validate_all`. Opens a span on entry and closes it on exit (C8).
    pub fn validate_all(&mut self, node: Term, report: Option<&mut Report>) -> Result<bool, EngineError> {
        let _guard = ScopedTickMeasurement::new(&mut self.budget, "validate_all");
        let validator = &mut self.validator;
        let store = &self.store;
        let dictionary = &self.dictionary;
        Ok(traced_span!(&mut self.telemetry, "validate_all", {
            validator.validate_all(store, dictionary, node, report)
        })?)
    }

    /// Pre-populates the property-count cache for `nodes`.
    pub fn warmup(&mut self, nodes: &[Term]) {
        self.validator.warmup(&self.store, nodes);
    }

    /// Cumulative cycle spend recorded against the composite-operation
    /// ceiling, broken down per named operation.
    pub fn budget_breakdown(&self) -> &[(&'static str, u64)] {
        self.budget.breakdown()
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    const RDF_TYPE: Term = 0;

    fn small_engine() -> Engine {
        Engine::create(HarnessConfig {
            max_subjects: 64,
            max_predicates: 8,
            max_objects: 512,
            rdf_type_predicate: RDF_TYPE,
            ..HarnessConfig::default()
        })
    }

    proptest! {
        // Invariant 1, through the public lifecycle API: any in-range
        // triple is immediately visible to `ask` after `add_triple`.
        #[test]
        fn prop_add_triple_then_ask_is_true_through_the_engine(s in 0u32..64, p in 0u32..8, o in 0u32..512) {
            let mut engine = small_engine();
            engine.add_triple(s, p, o).unwrap();
            prop_assert!(engine.ask(s, p, o));
        }

        // Invariant 3: a triple never inserted is never observed, across a
        // whole batch of other unrelated insertions.
        #[test]
        fn prop_ask_is_false_for_never_inserted_triples(
            inserted in prop::collection::vec((0u32..64, 0u32..8, 0u32..512), 0..10),
            probe in (0u32..64, 0u32..8, 0u32..512),
        ) {
            prop_assume!(!inserted.contains(&probe));
            let mut engine = small_engine();
            for &(s, p, o) in &inserted {
                engine.add_triple(s, p, o).unwrap();
            }
            prop_assert!(!engine.ask(probe.0, probe.1, probe.2));
        }
    }
}
