// Cycle-accurate timing and tick-budget enforcement for hot-path operations.

use crate::platform::unsafe_ops;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// CPU frequency in Hz, cached after calibration.
static CPU_FREQUENCY: AtomicU64 = AtomicU64::new(0);

/// Overhead of the cycle-read instruction itself (in cycles).
static READ_OVERHEAD: AtomicU64 = AtomicU64::new(0);

/// Read the hardware cycle counter.
#[inline(always)]
pub fn read_cycles() -> u64 {
    unsafe_ops::read_cycles()
}

/// Read the cycle counter with instruction-stream serialization.
#[inline(always)]
pub fn read_cycles_serialized() -> u64 {
    unsafe_ops::read_cycles_serialized()
}

/// Read the cycle counter fenced on both sides.
#[inline(always)]
pub fn read_cycles_fenced() -> u64 {
    unsafe_ops::read_cycles_fenced()
}

/// Errors raised by the tick-budget harness.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TimerError {
    #[error("tick budget exceeded: {spent} + {charged} = {total} > {budget} (operation: {operation})")]
    BudgetExceeded {
        operation: &'static str,
        spent: u64,
        charged: u64,
        total: u64,
        budget: u64,
    },
}

/// Result of calibrating the cycle counter against the wall clock.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationResult {
    pub cpu_freq_hz: u64,
    pub read_overhead_cycles: u64,
    pub cycles_per_ns: f64,
    pub confidence: f64,
}

/// Timer for hot-path measurements, compensated for read overhead.
pub struct HotPathTimer {
    start_cycles: u64,
    overhead: u64,
}

impl HotPathTimer {
    /// Start measuring immediately.
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            start_cycles: read_cycles(),
            overhead: READ_OVERHEAD.load(Ordering::Relaxed),
        }
    }

    /// Start with a serialized read (more accurate, higher overhead).
    #[inline(always)]
    pub fn start_serialized() -> Self {
        Self {
            start_cycles: read_cycles_serialized(),
            overhead: READ_OVERHEAD.load(Ordering::Relaxed),
        }
    }

    /// Elapsed cycles since `start`, compensated for read overhead.
    #[inline(always)]
    pub fn elapsed_cycles(&self) -> u64 {
        read_cycles()
            .saturating_sub(self.start_cycles)
            .saturating_sub(self.overhead)
    }

    /// Elapsed cycles is within `ceiling`.
    #[inline(always)]
    pub fn within_budget(&self, ceiling: u64) -> bool {
        self.elapsed_cycles() <= ceiling
    }

    /// Restart the timer at the current instant.
    #[inline(always)]
    pub fn reset(&mut self) {
        self.start_cycles = read_cycles();
    }
}

/// Calibrate the cycle counter against the wall clock.
///
/// Runs a fixed number of rounds, each busy-waiting a short wall-clock
/// interval while sampling cycles, then takes the median implied frequency.
pub fn calibrate() -> CalibrationResult {
    const CALIBRATION_ROUNDS: usize = 100;
    const CALIBRATION_DURATION_MS: u64 = 10;

    let overhead = measure_read_overhead();
    READ_OVERHEAD.store(overhead, Ordering::Relaxed);

    let mut frequencies = Vec::with_capacity(CALIBRATION_ROUNDS);

    for _ in 0..CALIBRATION_ROUNDS {
        let start_wall = std::time::Instant::now();
        let start_cycles = read_cycles_serialized();

        while start_wall.elapsed().as_millis() < CALIBRATION_DURATION_MS as u128 {
            std::hint::spin_loop();
        }

        let end_cycles = read_cycles_serialized();
        let elapsed_wall = start_wall.elapsed();

        let cycles = end_cycles - start_cycles;
        let nanos = elapsed_wall.as_nanos() as u64;
        let freq_hz = (cycles as f64 * 1_000_000_000.0 / nanos as f64) as u64;

        frequencies.push(freq_hz);
    }

    frequencies.sort_unstable();
    let median_freq = frequencies[frequencies.len() / 2];

    let mean = frequencies.iter().sum::<u64>() as f64 / frequencies.len() as f64;
    let variance = frequencies
        .iter()
        .map(|&f| {
            let diff = f as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / frequencies.len() as f64;

    let std_dev = variance.sqrt();
    let confidence = if std_dev > 0.0 {
        1.0 / (1.0 + std_dev / mean)
    } else {
        1.0
    };

    CPU_FREQUENCY.store(median_freq, Ordering::Relaxed);

    CalibrationResult {
        cpu_freq_hz: median_freq,
        read_overhead_cycles: overhead,
        cycles_per_ns: median_freq as f64 / 1_000_000_000.0,
        confidence,
    }
}

/// Measure the overhead of the cycle-read instruction itself.
fn measure_read_overhead() -> u64 {
    const ROUNDS: usize = 10_000;
    let mut measurements = Vec::with_capacity(ROUNDS);

    for _ in 0..100 {
        let _ = read_cycles();
    }

    for _ in 0..ROUNDS {
        let start = read_cycles_serialized();
        std::hint::black_box(read_cycles());
        let end = read_cycles_serialized();
        measurements.push(end - start);
    }

    // 10th percentile avoids outliers from scheduler interruption.
    measurements.sort_unstable();
    measurements[ROUNDS / 10]
}

/// Tracks cumulative tick spend against a fixed budget, per operation.
#[derive(Debug)]
pub struct TickBudget {
    budget: u64,
    spent: u64,
    operations: Vec<(&'static str, u64)>,
}

impl TickBudget {
    /// Build a budget with the given ceiling in cycles.
    #[inline]
    pub fn with_ceiling(budget: u64) -> Self {
        Self {
            budget,
            spent: 0,
            operations: Vec::with_capacity(8),
        }
    }

    /// Charge cycles for an operation, failing if the budget would be exceeded.
    #[inline]
    pub fn charge(&mut self, operation: &'static str, cycles: u64) -> Result<(), TimerError> {
        let total = self.spent.saturating_add(cycles);
        if total > self.budget {
            return Err(TimerError::BudgetExceeded {
                operation,
                spent: self.spent,
                charged: cycles,
                total,
                budget: self.budget,
            });
        }
        self.spent = total;
        self.operations.push((operation, cycles));
        Ok(())
    }

    #[inline(always)]
    pub fn remaining(&self) -> u64 {
        self.budget.saturating_sub(self.spent)
    }

    #[inline(always)]
    pub fn exhausted(&self) -> bool {
        self.spent >= self.budget
    }

    #[inline]
    pub fn reset(&mut self) {
        self.spent = 0;
        self.operations.clear();
    }

    pub fn breakdown(&self) -> &[(&'static str, u64)] {
        &self.operations
    }
}

impl Default for TickBudget {
    fn default() -> Self {
        Self::with_ceiling(7)
    }
}

/// Scoped measurement that charges its elapsed cycles to a `TickBudget` on drop.
///
/// Overruns are recorded via `tracing::warn!` rather than panicking: the
/// ceiling is a telemetry gate, not a correctness condition.
pub struct ScopedTickMeasurement<'a> {
    budget: &'a mut TickBudget,
    operation: &'static str,
    start: u64,
}

impl<'a> ScopedTickMeasurement<'a> {
    #[inline]
    pub fn new(budget: &'a mut TickBudget, operation: &'static str) -> Self {
        Self {
            budget,
            operation,
            start: read_cycles(),
        }
    }
}

impl<'a> Drop for ScopedTickMeasurement<'a> {
    #[inline]
    fn drop(&mut self) {
        let elapsed = read_cycles().saturating_sub(self.start);
        if let Err(err) = self.budget.charge(self.operation, elapsed) {
            tracing::warn!(%err, operation = self.operation, elapsed, "tick budget exceeded");
        }
    }
}

/// Measure the wrapped block's elapsed cycles against `$budget`.
#[macro_export]
macro_rules! measure_ticks {
    ($budget:expr, $op:literal, $code:block) => {{
        let _guard = $crate::timer::ScopedTickMeasurement::new($budget, $op);
        $code
    }};
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // A sequence of charges that never pushes cumulative spend past the
        // ceiling must all succeed, and `remaining()` must always equal
        // `budget - spent` exactly.
        #[test]
        fn prop_charges_within_ceiling_always_succeed(charges in prop::collection::vec(0u64..20, 0..15)) {
            let ceiling: u64 = 1000;
            let mut budget = TickBudget::with_ceiling(ceiling);
            let mut spent = 0u64;
            for c in charges {
                if spent + c > ceiling {
                    break;
                }
                prop_assert!(budget.charge("op", c).is_ok());
                spent += c;
                prop_assert_eq!(budget.remaining(), ceiling - spent);
            }
        }

        // reset() always brings spend back to zero and clears the breakdown.
        #[test]
        fn prop_reset_always_zeroes_spend(charges in prop::collection::vec(0u64..5, 0..10)) {
            let mut budget = TickBudget::with_ceiling(1000);
            for c in charges {
                let _ = budget.charge("op", c);
            }
            budget.reset();
            prop_assert_eq!(budget.remaining(), 1000);
            prop_assert!(budget.breakdown().is_empty());
        }
    }
}
