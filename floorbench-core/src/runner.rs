//! Trial runner.
//!
//! Runs one probe through its full trial: fixture setup, warmup batches
//! (discarded), measured batches (recorded), teardown. Per-probe state
//! machine: Pending -> Warmup -> Measuring -> Done, with Failed reachable
//! from any point.
//!
//! Only `invoke` sits inside the timer. Invocations are grouped into timed
//! slices; a slice whose elapsed time is under the 10 ms clock-resolution
//! floor doubles its invocation count, keeping relative clock error bounded.
//! Iteration-scoped probes run untimed setup before each invocation, so
//! their slices stay at one invocation.

use crate::measure::Timer;
use crate::probe::{Probe, SetupScope};
use crate::ProbeError;

/// Minimum timed-slice duration. Slices below this double their invocation
/// count so clock granularity stays a small fraction of the reading.
pub const MIN_SLICE_NS: u64 = 10_000_000;

/// Per-probe trial phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    /// Trial not started.
    Pending,
    /// Discarded warmup batches running.
    Warmup,
    /// Recorded batches running.
    Measuring,
    /// Trial completed and produced a result.
    Done,
    /// Trial aborted; the probe is reported FAILED.
    Failed,
}

/// Resolved per-probe measurement plan (windows in nanoseconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialPlan {
    /// Warmup batches, discarded. Zero skips warmup entirely.
    pub warmup_batches: u32,
    /// Minimum wall-clock window per warmup batch.
    pub warmup_window_ns: u64,
    /// Measured batches, recorded.
    pub measure_batches: u32,
    /// Minimum wall-clock window per measured batch.
    pub measure_window_ns: u64,
}

/// Immutable record of one probe's completed trial. All timing is in
/// nanoseconds; unit normalization happens in the reporting sink.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    /// Probe name.
    pub probe: String,
    /// Total measured invocations across all recorded batches.
    pub invocations: u64,
    /// Total timed nanoseconds across all recorded batches.
    pub total_ns: u64,
    /// Mean nanoseconds per invocation of each recorded batch, in batch
    /// order. Lets the sink estimate spread without shipping raw slices.
    pub batch_mean_ns: Vec<f64>,
}

impl TrialResult {
    /// Average time per invocation over the whole measurement phase.
    pub fn average_ns(&self) -> f64 {
        if self.invocations == 0 {
            0.0
        } else {
            self.total_ns as f64 / self.invocations as f64
        }
    }
}

/// One batch's accumulated timing.
struct BatchStats {
    timed_ns: u64,
    invocations: u64,
}

impl BatchStats {
    fn mean_ns(&self) -> f64 {
        if self.invocations == 0 {
            0.0
        } else {
            self.timed_ns as f64 / self.invocations as f64
        }
    }
}

/// Calls `teardown_trial` exactly once when dropped, covering every exit
/// path out of the trial: success, probe error, panic.
struct TeardownGuard<'a> {
    probe: &'a mut dyn Probe,
}

impl Drop for TeardownGuard<'_> {
    fn drop(&mut self) {
        self.probe.teardown_trial();
    }
}

/// Run one probe through a full trial.
///
/// The fixture is allocated before warmup and released on every exit path.
/// An error from `setup_trial`, `setup_iteration` or `invoke` aborts the
/// trial; the caller reports the probe FAILED and moves on.
pub fn run_trial(probe: &mut dyn Probe, plan: &TrialPlan) -> Result<TrialResult, ProbeError> {
    let name = probe.name();
    let mut state = TrialState::Pending;
    let mut guard = TeardownGuard { probe };

    if let Err(e) = guard.probe.setup_trial() {
        advance(name, &mut state, TrialState::Failed);
        return Err(e);
    }

    advance(name, &mut state, TrialState::Warmup);
    for batch in 0..plan.warmup_batches {
        if let Err(e) = run_batch(&mut *guard.probe, plan.warmup_window_ns) {
            advance(name, &mut state, TrialState::Failed);
            return Err(e);
        }
        tracing::trace!(probe = name, batch, "warmup batch complete");
    }

    advance(name, &mut state, TrialState::Measuring);
    let mut invocations = 0u64;
    let mut total_ns = 0u64;
    let mut batch_mean_ns = Vec::with_capacity(plan.measure_batches as usize);

    for batch in 0..plan.measure_batches {
        let stats = match run_batch(&mut *guard.probe, plan.measure_window_ns) {
            Ok(stats) => stats,
            Err(e) => {
                advance(name, &mut state, TrialState::Failed);
                return Err(e);
            }
        };
        tracing::trace!(
            probe = name,
            batch,
            invocations = stats.invocations,
            mean_ns = stats.mean_ns(),
            "measured batch complete"
        );
        invocations += stats.invocations;
        total_ns += stats.timed_ns;
        batch_mean_ns.push(stats.mean_ns());
    }

    advance(name, &mut state, TrialState::Done);
    Ok(TrialResult {
        probe: name.to_string(),
        invocations,
        total_ns,
        batch_mean_ns,
    })
}

fn advance(probe: &str, state: &mut TrialState, next: TrialState) {
    tracing::debug!(probe, from = ?*state, to = ?next, "trial state");
    *state = next;
}

/// Run one batch: timed slices of invocations until the wall-clock window
/// elapses. With a zero window exactly one slice runs, so a single-batch
/// plan records exactly one invocation.
fn run_batch(probe: &mut dyn Probe, window_ns: u64) -> Result<BatchStats, ProbeError> {
    let scope = probe.setup_scope();
    let batch_start = std::time::Instant::now();
    let mut timed_ns = 0u64;
    let mut invocations = 0u64;
    let mut slice_len = 1u64;

    loop {
        match scope {
            SetupScope::Iteration => {
                // Untimed refresh before each measured call keeps setup cost
                // out of the reading; slices stay at one invocation.
                probe.setup_iteration()?;
                let timer = Timer::start();
                let out = probe.invoke()?;
                std::hint::black_box(out);
                timed_ns += timer.stop();
                invocations += 1;
            }
            SetupScope::Trial => {
                let timer = Timer::start();
                for _ in 0..slice_len {
                    let out = probe.invoke()?;
                    std::hint::black_box(out);
                }
                let ns = timer.stop();
                timed_ns += ns;
                invocations += slice_len;
                if ns < MIN_SLICE_NS {
                    slice_len = slice_len.saturating_mul(2);
                }
            }
        }

        if batch_start.elapsed().as_nanos() >= window_ns as u128 {
            break;
        }
    }

    Ok(BatchStats {
        timed_ns,
        invocations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{Observed, Probe, SetupScope};

    /// Counts lifecycle calls; optionally fails at a chosen invocation.
    struct CountingProbe {
        scope: SetupScope,
        fail_setup: bool,
        fail_on_invocation: Option<u64>,
        setups: u64,
        iteration_setups: u64,
        invocations: u64,
        teardowns: u64,
    }

    impl CountingProbe {
        fn new() -> Self {
            Self {
                scope: SetupScope::Trial,
                fail_setup: false,
                fail_on_invocation: None,
                setups: 0,
                iteration_setups: 0,
                invocations: 0,
                teardowns: 0,
            }
        }
    }

    impl Probe for CountingProbe {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn setup_scope(&self) -> SetupScope {
            self.scope
        }

        fn setup_trial(&mut self) -> Result<(), ProbeError> {
            self.setups += 1;
            if self.fail_setup {
                return Err(ProbeError::fixture("simulated disk full"));
            }
            Ok(())
        }

        fn setup_iteration(&mut self) -> Result<(), ProbeError> {
            self.iteration_setups += 1;
            Ok(())
        }

        fn invoke(&mut self) -> Result<Observed, ProbeError> {
            self.invocations += 1;
            if self.fail_on_invocation == Some(self.invocations) {
                return Err(ProbeError::measurement("simulated read error"));
            }
            Ok(Observed::Checksum(self.invocations))
        }

        fn teardown_trial(&mut self) {
            self.teardowns += 1;
        }
    }

    fn single_shot_plan() -> TrialPlan {
        TrialPlan {
            warmup_batches: 0,
            warmup_window_ns: 0,
            measure_batches: 1,
            measure_window_ns: 0,
        }
    }

    #[test]
    fn test_single_shot_records_one_invocation() {
        let mut probe = CountingProbe::new();
        let result = run_trial(&mut probe, &single_shot_plan()).unwrap();

        assert_eq!(result.invocations, 1);
        assert_eq!(result.batch_mean_ns.len(), 1);
        assert!((result.average_ns() - result.total_ns as f64).abs() < f64::EPSILON);
    }

    #[test]
    fn test_teardown_runs_once_on_success() {
        let mut probe = CountingProbe::new();
        run_trial(&mut probe, &single_shot_plan()).unwrap();

        assert_eq!(probe.setups, 1);
        assert_eq!(probe.teardowns, 1);
    }

    #[test]
    fn test_teardown_runs_once_on_measurement_failure() {
        let mut probe = CountingProbe::new();
        probe.fail_on_invocation = Some(1);

        let err = run_trial(&mut probe, &single_shot_plan()).unwrap_err();
        assert!(matches!(err, ProbeError::Measurement(_)));
        assert_eq!(probe.teardowns, 1);
    }

    #[test]
    fn test_teardown_runs_once_on_setup_failure() {
        let mut probe = CountingProbe::new();
        probe.fail_setup = true;

        let err = run_trial(&mut probe, &single_shot_plan()).unwrap_err();
        assert!(matches!(err, ProbeError::FixtureSetup(_)));
        assert_eq!(probe.teardowns, 1);
        assert_eq!(probe.invocations, 0);
    }

    #[test]
    fn test_warmup_invocations_discarded() {
        let mut probe = CountingProbe::new();
        let plan = TrialPlan {
            warmup_batches: 2,
            warmup_window_ns: 0,
            measure_batches: 1,
            measure_window_ns: 0,
        };
        let result = run_trial(&mut probe, &plan).unwrap();

        // Two warmup invocations ran but only the measured one is recorded.
        assert_eq!(probe.invocations, 3);
        assert_eq!(result.invocations, 1);
    }

    #[test]
    fn test_iteration_scope_runs_setup_before_each_invocation() {
        let mut probe = CountingProbe::new();
        probe.scope = SetupScope::Iteration;
        let plan = TrialPlan {
            warmup_batches: 1,
            warmup_window_ns: 0,
            measure_batches: 2,
            measure_window_ns: 0,
        };
        run_trial(&mut probe, &plan).unwrap();

        assert_eq!(probe.iteration_setups, probe.invocations);
    }

    #[test]
    fn test_timed_window_accumulates_invocations() {
        let mut probe = CountingProbe::new();
        let plan = TrialPlan {
            warmup_batches: 0,
            warmup_window_ns: 0,
            measure_batches: 1,
            measure_window_ns: 20_000_000, // 20ms
        };
        let result = run_trial(&mut probe, &plan).unwrap();

        // A near-instant probe must have its slice grown well past one.
        assert!(result.invocations > 1);
        assert!(result.total_ns > 0);
    }

    #[test]
    fn test_mid_batch_failure_aborts_remaining_batches() {
        let mut probe = CountingProbe::new();
        probe.fail_on_invocation = Some(2);
        let plan = TrialPlan {
            warmup_batches: 0,
            warmup_window_ns: 0,
            measure_batches: 5,
            measure_window_ns: 0,
        };

        run_trial(&mut probe, &plan).unwrap_err();
        // Invocation 2 failed; batches 3..5 never ran.
        assert_eq!(probe.invocations, 2);
        assert_eq!(probe.teardowns, 1);
    }
}
