//! Harness configuration: the knobs every other crate in this workspace
//! exposes as constructor arguments, grouped into one struct so `Engine`
//! construction takes a config value instead of a growing parameter list.

use heptad_store::Term;
use heptad_timer::{COMPOSITE_CEILING, PRIMITIVE_CEILING};
use heptad_validate::DEFAULT_CACHE_SIZE;

/// No file or environment parsing lives here — that belongs to whatever
/// embeds this engine. Every field is a plain value the caller sets
/// directly or accepts by default.
#[derive(Debug, Clone, Copy)]
pub struct HarnessConfig {
    pub max_subjects: u32,
    pub max_predicates: u32,
    pub max_objects: u32,
    pub primitive_ceiling: u64,
    pub composite_ceiling: u64,
    pub property_count_cache_size: usize,
    /// Predicate id this engine treats as `rdf:type` for scans and
    /// target-class checks.
    pub rdf_type_predicate: Term,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            max_subjects: 4096,
            max_predicates: 64,
            max_objects: 65_536,
            primitive_ceiling: PRIMITIVE_CEILING,
            composite_ceiling: COMPOSITE_CEILING,
            property_count_cache_size: DEFAULT_CACHE_SIZE,
            rdf_type_predicate: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ceilings_match_the_timer_crate() {
        let config = HarnessConfig::default();
        assert_eq!(config.primitive_ceiling, PRIMITIVE_CEILING);
        assert_eq!(config.composite_ceiling, COMPOSITE_CEILING);
    }
}
