//! Report Data Structures

use chrono::{DateTime, Utc};
use floorbench_core::{TimeUnit, TrialResult};
use serde::{Deserialize, Serialize};

/// Complete suite report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Run metadata (versions, system, configuration).
    pub meta: ReportMeta,
    /// One row per probe, in registration order.
    pub rows: Vec<ProbeRow>,
    /// Aggregate counts.
    pub summary: ReportSummary,
}

impl Report {
    /// Assemble a report from per-probe rows, computing the summary.
    pub fn new(meta: ReportMeta, rows: Vec<ProbeRow>, total_duration_ms: f64) -> Self {
        let done = rows
            .iter()
            .filter(|r| r.status == ProbeStatus::Done)
            .count();
        let summary = ReportSummary {
            total_probes: rows.len(),
            done,
            failed: rows.len() - done,
            total_duration_ms,
        };
        Self {
            meta,
            rows,
            summary,
        }
    }

    /// Whether any probe ended in a FAILED row.
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Harness version.
    pub version: String,
    /// UTC time the report was generated.
    pub timestamp: DateTime<Utc>,
    /// Current git commit hash, if available.
    pub git_commit: Option<String>,
    /// Current git branch, if available.
    pub git_branch: Option<String>,
    /// Host system details.
    pub system: SystemInfo,
    /// Configuration the suite ran with.
    pub config: ReportConfig,
}

/// Execution configuration captured in report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Warmup batches per probe.
    pub warmup_batches: u32,
    /// Warmup batch window in nanoseconds.
    pub warmup_window_ns: u64,
    /// Measured batches per probe.
    pub measure_batches: u32,
    /// Measured batch window in nanoseconds.
    pub measure_window_ns: u64,
    /// Whether each probe ran in its own worker process.
    pub fork_per_probe: bool,
    /// Unit used by the human sink.
    pub time_unit: TimeUnit,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name.
    pub os: String,
    /// Target architecture.
    pub arch: String,
    /// CPU model name, or "Unknown".
    pub cpu: String,
    /// Logical CPU count.
    pub cpu_cores: u32,
    /// Total system RAM in GB (0 where unavailable).
    pub memory_gb: f64,
}

/// Probe execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// Trial completed and produced a measurement.
    Done,
    /// Trial aborted; no measurement.
    Failed,
}

/// One probe's row in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRow {
    /// Probe name.
    pub name: String,
    /// Terminal state of the trial.
    pub status: ProbeStatus,
    /// Timing, present iff status is `Done`.
    pub measurement: Option<Measurement>,
    /// Failure detail, present iff status is `Failed`.
    pub failure: Option<FailureInfo>,
}

impl ProbeRow {
    /// Row for a completed trial.
    pub fn done(result: &TrialResult) -> Self {
        Self {
            name: result.probe.clone(),
            status: ProbeStatus::Done,
            measurement: Some(Measurement::from(result)),
            failure: None,
        }
    }

    /// Row for an aborted trial.
    pub fn failed(name: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ProbeStatus::Failed,
            measurement: None,
            failure: Some(FailureInfo {
                kind: kind.into(),
                message: message.into(),
            }),
        }
    }
}

/// Probe timing metrics, always stored in nanoseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    /// Recorded batches.
    pub batches: usize,
    /// Total measured invocations.
    pub invocations: u64,
    /// Average nanoseconds per invocation over the whole measurement phase.
    pub average_ns: f64,
    /// Population standard deviation of the per-batch means.
    pub std_dev_ns: f64,
    /// Fastest batch mean.
    pub min_batch_ns: f64,
    /// Slowest batch mean.
    pub max_batch_ns: f64,
}

impl From<&TrialResult> for Measurement {
    fn from(result: &TrialResult) -> Self {
        let means = &result.batch_mean_ns;
        let n = means.len().max(1) as f64;
        let mean_of_means = means.iter().sum::<f64>() / n;
        let variance = means
            .iter()
            .map(|m| (m - mean_of_means).powi(2))
            .sum::<f64>()
            / n;

        Self {
            batches: means.len(),
            invocations: result.invocations,
            average_ns: result.average_ns(),
            std_dev_ns: variance.sqrt(),
            min_batch_ns: means.iter().copied().fold(f64::INFINITY, f64::min),
            max_batch_ns: means.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Failure information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureInfo {
    /// Error category ("fixture-setup", "measurement", "panic", ...).
    pub kind: String,
    /// Human-readable reason shown on the FAILED row.
    pub message: String,
}

/// Report summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Probes in the report.
    pub total_probes: usize,
    /// Probes that completed.
    pub done: usize,
    /// Probes that failed.
    pub failed: usize,
    /// Wall-clock duration of the whole run.
    pub total_duration_ms: f64,
}
