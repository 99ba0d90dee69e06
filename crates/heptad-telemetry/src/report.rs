//! The JSON benchmark surface emitted at harness termination.

use serde::Serialize;

/// Summary emitted to stdout once a benchmark run completes. Always
/// compiled in, independent of the `spans` feature: this is the harness's
/// pass/fail surface, not the optional per-kernel span exporter.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub benchmark: String,
    pub iterations: u64,
    pub test_cases: u64,
    pub passed: u64,
    pub failed: u64,
    pub avg_cycles: f64,
    pub seven_tick_compliant: bool,
    pub status: String,
}

impl BenchmarkReport {
    pub fn new(benchmark: impl Into<String>, iterations: u64, test_cases: u64, passed: u64, total_cycles: u64, ceiling: u64) -> Self {
        let failed = test_cases.saturating_sub(passed);
        let avg_cycles = if iterations == 0 { 0.0 } else { total_cycles as f64 / iterations as f64 };
        let seven_tick_compliant = avg_cycles <= ceiling as f64;
        Self {
            benchmark: benchmark.into(),
            iterations,
            test_cases,
            passed,
            failed,
            avg_cycles,
            seven_tick_compliant,
            status: if failed == 0 { "pass".to_string() } else { "fail".to_string() },
        }
    }

    /// Exit code the benchmark harness should return: `0` on full pass,
    /// `1` on any failure (correctness or ceiling).
    pub fn exit_code(&self) -> i32 {
        if self.status == "pass" && self.seven_tick_compliant {
            0
        } else {
            1
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
