#![warn(missing_docs)]
//! # FloorBench
//!
//! Micro-benchmark harness measuring the latency floor of OS and runtime
//! primitives: uncontended mutex locking, sequential memory reads,
//! sequential disk reads, gzip compression, and loopback reachability.
//!
//! - **Process Isolation**: each probe's trial runs in a freshly spawned
//!   worker process by default, so a crashing probe cannot take down the
//!   suite and fixture state never leaks between probes
//! - **Zero-Copy IPC**: supervisor-worker communication uses rkyv-serialized
//!   messages over length-prefixed pipe frames
//! - **Batched Measurement**: warmup batches are discarded, then timed
//!   batches accumulate invocations until a wall-clock window elapses
//!
//! ## Quick Start
//!
//! ```ignore
//! // Run every probe with the default plan (3 warmup + 5 measured batches):
//! //   floorbench
//! // Only the disk probe, reported in microseconds:
//! //   floorbench disk_read --unit us
//! fn main() -> anyhow::Result<()> {
//!     floorbench::run()
//! }
//! ```

// Re-export core types
pub use floorbench_core::{
    run_trial, ConfigError, Observed, Probe, ProbeError, SetupScope, SuiteConfig, TimeUnit, Timer,
    TrialPlan, TrialResult, TrialState,
};

// Re-export the probe registry
pub use floorbench_probes::{probe_by_name, registry, PROBE_NAMES};

// Re-export report types
pub use floorbench_report::{
    build_report_meta, generate_human_report, generate_json_report, Measurement, OutputFormat,
    ProbeRow, ProbeStatus, Report,
};

// Re-export executors for embedding the suite in other binaries
pub use floorbench_cli::{Executor, IsolatedExecutor, ProbeOutcome};

/// Run the FloorBench CLI. This is the main entry point for the binary.
pub fn run() -> anyhow::Result<()> {
    floorbench_cli::run()
}
