//! Probe Execution
//!
//! Runs the probe suite in one of two modes:
//!
//! - **In-process (`Executor`)**: trials run in the CLI process. Fast, but a
//!   panicking probe takes the whole run down with it (panics are still
//!   caught per-probe). Useful for debugging and tests.
//! - **Isolated (`IsolatedExecutor`)**: each probe's trial runs in a freshly
//!   spawned worker process, so fixture state and crashes cannot leak
//!   between probes. This is the default.

use crate::supervisor::{IpcProbeStatus, SupervisorError, WorkerHandle};
use floorbench_core::{run_trial, Probe, ProbeError, TrialPlan, TrialResult};
use floorbench_ipc::{FailureKind, TrialConfig};
use floorbench_report::ProbeRow;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Outcome of one probe's trial, before report assembly
#[derive(Debug)]
pub struct ProbeOutcome {
    /// Probe name.
    pub name: String,
    /// Completed result, or failure category and reason.
    pub status: Result<TrialResult, ProbeFailure>,
}

/// Failure category and reason for a FAILED row
#[derive(Debug, Clone)]
pub struct ProbeFailure {
    /// Error category ("fixture-setup", "measurement", "panic", ...).
    pub kind: String,
    /// Human-readable reason.
    pub message: String,
}

impl ProbeOutcome {
    /// Convert into a report row.
    pub fn into_row(self) -> ProbeRow {
        match self.status {
            Ok(result) => ProbeRow::done(&result),
            Err(failure) => ProbeRow::failed(self.name, failure.kind, failure.message),
        }
    }
}

fn failure_kind_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::FixtureSetup => "fixture-setup",
        FailureKind::Measurement => "measurement",
        FailureKind::Panic => "panic",
        FailureKind::UnknownProbe => "unknown-probe",
    }
}

fn probe_error_failure(error: &ProbeError) -> ProbeFailure {
    let kind = match error {
        ProbeError::FixtureSetup(_) => "fixture-setup",
        ProbeError::Measurement(_) => "measurement",
    };
    ProbeFailure {
        kind: kind.to_string(),
        message: error.to_string(),
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn suite_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Execute probes in the CLI process (no isolation)
pub struct Executor {
    plan: TrialPlan,
}

impl Executor {
    /// Create an in-process executor for the given plan.
    pub fn new(plan: TrialPlan) -> Self {
        Self { plan }
    }

    /// Execute all provided probes, in order.
    pub fn execute(&self, probes: Vec<Box<dyn Probe>>) -> Vec<ProbeOutcome> {
        let pb = suite_progress_bar(probes.len() as u64);

        let mut outcomes = Vec::with_capacity(probes.len());
        for mut probe in probes {
            pb.set_message(probe.name().to_string());
            outcomes.push(self.execute_single(probe.as_mut()));
            pb.inc(1);
        }

        pb.finish_with_message("Complete");
        outcomes
    }

    /// Execute a single probe's trial with panic catching.
    fn execute_single(&self, probe: &mut dyn Probe) -> ProbeOutcome {
        let name = probe.name().to_string();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run_trial(probe, &self.plan)
        }));

        let status = match result {
            Ok(Ok(trial)) => Ok(trial),
            Ok(Err(error)) => {
                tracing::warn!(probe = %name, %error, "probe trial failed");
                Err(probe_error_failure(&error))
            }
            Err(panic) => {
                let message = panic_message(panic);
                tracing::warn!(probe = %name, message, "probe panicked");
                Err(ProbeFailure {
                    kind: "panic".to_string(),
                    message,
                })
            }
        };

        ProbeOutcome { name, status }
    }
}

/// Execute each probe in a freshly spawned worker process
///
/// Crash isolation: a panicking or aborting probe cannot take down the
/// supervisor, and fixture state never survives into the next probe.
pub struct IsolatedExecutor {
    plan: TrialPlan,
    timeout: Duration,
}

impl IsolatedExecutor {
    /// Create an isolated executor for the given plan.
    pub fn new(plan: TrialPlan, timeout: Duration) -> Self {
        Self { plan, timeout }
    }

    /// Execute all named probes, spawning one worker per probe.
    pub fn execute(&self, probe_names: &[&str]) -> Vec<ProbeOutcome> {
        let pb = suite_progress_bar(probe_names.len() as u64);
        pb.set_message("Starting isolated workers...");

        let config = TrialConfig {
            warmup_batches: self.plan.warmup_batches,
            warmup_window_ns: self.plan.warmup_window_ns,
            measure_batches: self.plan.measure_batches,
            measure_window_ns: self.plan.measure_window_ns,
        };

        let mut outcomes = Vec::with_capacity(probe_names.len());
        for &name in probe_names {
            pb.set_message(name.to_string());
            outcomes.push(self.execute_isolated(name, &config));
            pb.inc(1);
        }

        pb.finish_with_message("Complete (isolated)");
        outcomes
    }

    /// Spawn a worker, run one probe, and shut the worker down.
    fn execute_isolated(&self, name: &str, config: &TrialConfig) -> ProbeOutcome {
        let status = match self.run_in_worker(name, config) {
            Ok(IpcProbeStatus::Complete(record)) => Ok(TrialResult {
                probe: record.probe,
                invocations: record.invocations,
                total_ns: record.total_ns,
                batch_mean_ns: record.batch_mean_ns,
            }),
            Ok(IpcProbeStatus::Failed { kind, message }) => Err(ProbeFailure {
                kind: failure_kind_label(kind).to_string(),
                message,
            }),
            Err(SupervisorError::Timeout) => Err(ProbeFailure {
                kind: "timeout".to_string(),
                message: format!("trial exceeded worker timeout of {:?}", self.timeout),
            }),
            Err(e) => Err(ProbeFailure {
                kind: "crash".to_string(),
                message: e.to_string(),
            }),
        };

        ProbeOutcome {
            name: name.to_string(),
            status,
        }
    }

    fn run_in_worker(
        &self,
        name: &str,
        config: &TrialConfig,
    ) -> Result<IpcProbeStatus, SupervisorError> {
        let mut worker = WorkerHandle::spawn(self.timeout)?;
        let result = worker.run_probe(name, config);
        let _ = worker.shutdown();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorbench_probes::registry;

    fn tiny_plan() -> TrialPlan {
        TrialPlan {
            warmup_batches: 0,
            warmup_window_ns: 0,
            measure_batches: 1,
            measure_window_ns: 0,
        }
    }

    #[test]
    fn test_in_process_lock_probe() {
        let executor = Executor::new(tiny_plan());
        let probes = registry()
            .into_iter()
            .filter(|p| p.name() == "lock")
            .collect();
        let outcomes = executor.execute(probes);

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].name, "lock");
        let result = outcomes[0].status.as_ref().expect("lock trial failed");
        assert_eq!(result.invocations, 1);
    }

    #[test]
    fn test_outcomes_preserve_registration_order() {
        let executor = Executor::new(tiny_plan());
        let probes = registry()
            .into_iter()
            .filter(|p| p.name() == "lock" || p.name() == "gzip_compress")
            .collect();
        let outcomes = executor.execute(probes);

        let names: Vec<_> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["lock", "gzip_compress"]);
    }

    #[test]
    fn test_failed_outcome_becomes_failed_row() {
        let outcome = ProbeOutcome {
            name: "disk_read".to_string(),
            status: Err(ProbeFailure {
                kind: "fixture-setup".to_string(),
                message: "disk full".to_string(),
            }),
        };

        let row = outcome.into_row();
        assert_eq!(row.name, "disk_read");
        assert_eq!(row.status, floorbench_report::ProbeStatus::Failed);
        assert_eq!(row.failure.as_ref().unwrap().message, "disk full");
    }
}
