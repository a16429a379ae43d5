#![warn(missing_docs)]
//! FloorBench Core - Probe Lifecycle and Trial Runner
//!
//! This crate provides the measurement engine for floorbench:
//! - The `Probe` trait with explicit lifecycle hooks (`setup_trial`,
//!   `setup_iteration`, `invoke`, `teardown_trial`)
//! - Monotonic high-resolution timing with CPU affinity pinning
//! - The trial runner state machine (warmup batches, measured batches,
//!   clock-resolution-aware slice growth, guaranteed teardown)
//! - Suite configuration and the error taxonomy

mod config;
mod error;
mod measure;
mod probe;
mod runner;

pub use config::{SuiteConfig, TimeUnit};
pub use error::{ConfigError, ProbeError};
pub use measure::{pin_to_cpu, Timer};
pub use probe::{Observed, Probe, SetupScope};
pub use runner::{run_trial, TrialPlan, TrialResult, TrialState, MIN_SLICE_NS};
