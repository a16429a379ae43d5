//! IPC message types.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

/// Trial plan shipped to the worker with a `Run` command.
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct TrialConfig {
    /// Warmup batches (discarded).
    pub warmup_batches: u32,
    /// Warmup batch window in nanoseconds.
    pub warmup_window_ns: u64,
    /// Measured batches (recorded).
    pub measure_batches: u32,
    /// Measured batch window in nanoseconds.
    pub measure_window_ns: u64,
}

/// Completed trial result shipped back from the worker. Mirrors the core
/// `TrialResult`; timing stays in nanoseconds on the wire.
#[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct TrialRecord {
    /// Probe name.
    pub probe: String,
    /// Total measured invocations.
    pub invocations: u64,
    /// Total timed nanoseconds.
    pub total_ns: u64,
    /// Per-batch mean nanoseconds, in batch order.
    pub batch_mean_ns: Vec<f64>,
}

/// Worker capabilities advertised during the handshake.
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct WorkerCapabilities {
    /// Protocol version for compatibility.
    pub protocol_version: u32,
    /// Number of logical CPUs available to the worker.
    pub cpu_count: u32,
}

impl Default for WorkerCapabilities {
    fn default() -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION,
            cpu_count: std::thread::available_parallelism()
                .map(|p| p.get() as u32)
                .unwrap_or(1),
        }
    }
}

/// Why a probe's trial failed inside the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum FailureKind {
    /// Fixture allocation failed.
    FixtureSetup,
    /// `invoke` failed mid-trial.
    Measurement,
    /// The probe panicked (caught before the process died).
    Panic,
    /// The requested probe does not exist in the registry.
    UnknownProbe,
}

/// Commands sent from supervisor to worker.
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum SupervisorCommand {
    /// Run one probe's full trial.
    Run {
        /// Probe name to look up in the registry.
        probe: String,
        /// Trial plan for this run.
        config: TrialConfig,
    },
    /// Request graceful shutdown.
    Shutdown,
}

/// Messages sent from worker to supervisor.
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum WorkerMessage {
    /// Initial handshake with worker capabilities.
    Hello(WorkerCapabilities),
    /// Trial completed; here is the record.
    Complete(TrialRecord),
    /// Trial failed.
    Failure {
        /// Error category.
        kind: FailureKind,
        /// Human-readable reason, surfaced on the FAILED report row.
        message: String,
    },
}
