//! Error taxonomy.
//!
//! Probe errors are fatal to one probe only; the suite always continues to
//! the next probe and reports the failed one explicitly. Configuration errors
//! are fatal to the whole suite before any probe runs.

use thiserror::Error;

/// Errors raised by a probe during its trial.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Fixture allocation failed (disk full, permission denied, ...).
    /// The probe's trial aborts before any measurement is recorded.
    #[error("fixture setup failed: {0}")]
    FixtureSetup(String),

    /// `invoke` (or iteration-scoped setup) failed mid-trial. Remaining
    /// iterations of this probe are abandoned.
    #[error("measurement failed: {0}")]
    Measurement(String),
}

impl ProbeError {
    /// Wrap a fixture setup failure.
    pub fn fixture(err: impl std::fmt::Display) -> Self {
        ProbeError::FixtureSetup(err.to_string())
    }

    /// Wrap a mid-measurement failure.
    pub fn measurement(err: impl std::fmt::Display) -> Self {
        ProbeError::Measurement(err.to_string())
    }
}

/// Suite-level configuration errors, checked before any probe runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// At least one measured batch is required to produce a Measurement.
    #[error("measure_batches must be >= 1")]
    ZeroMeasureBatches,

    /// A time unit string that is not one of ns/us/ms/s.
    #[error("unknown time unit '{0}' (expected ns, us, ms or s)")]
    UnknownTimeUnit(String),
}
