//! The Probe trait - one unit of measured work.
//!
//! Each probe wraps exactly one primitive operation. Lifecycle hooks are
//! explicit methods invoked by the trial runner; fixture state is owned by
//! the probe itself and never shared across probes.

use crate::ProbeError;

/// Scope of per-probe setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupScope {
    /// Fixture prepared once per trial in `setup_trial`.
    Trial,
    /// Fixture additionally refreshed before every measured invocation via
    /// `setup_iteration` (run untimed; slices are forced to one invocation).
    Iteration,
}

/// Result of one probe invocation, materialized so the runner can pass it
/// through `std::hint::black_box` and keep the measured work observable.
#[derive(Debug)]
pub enum Observed {
    /// The operation's only observable effect is its latency (lock probe).
    Unit,
    /// Wrapping byte-sum over the data that was read.
    Checksum(u64),
    /// Fully materialized output bytes (compressed buffer).
    Bytes(Vec<u8>),
    /// Whether the target answered within the bound.
    Reachable(bool),
}

/// One unit of measured work wrapping a single primitive operation.
pub trait Probe {
    /// Unique probe name, stable across runs; used for registry lookup,
    /// report rows and IPC routing.
    fn name(&self) -> &'static str;

    /// Whether this probe's fixture is trial-scoped or refreshed per
    /// iteration.
    fn setup_scope(&self) -> SetupScope {
        SetupScope::Trial
    }

    /// Allocate the fixture. Called exactly once before any invocation of
    /// this probe. A failure here aborts the probe's trial; the runner must
    /// not proceed with an absent fixture.
    fn setup_trial(&mut self) -> Result<(), ProbeError>;

    /// Refresh iteration-scoped fixture state. Only called for
    /// `SetupScope::Iteration` probes, untimed, before each measured call.
    fn setup_iteration(&mut self) -> Result<(), ProbeError> {
        Ok(())
    }

    /// The measured call.
    fn invoke(&mut self) -> Result<Observed, ProbeError>;

    /// Release the fixture. The runner guarantees this is called exactly
    /// once per trial on every exit path, including mid-measurement failure.
    /// Must tolerate being called after a failed `setup_trial`.
    fn teardown_trial(&mut self);
}
