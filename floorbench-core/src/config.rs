//! Suite configuration.
//!
//! An explicit struct passed into the suite; no global state. The CLI layers
//! `floorbench.toml` and command-line flags on top of these defaults.

use crate::{ConfigError, TrialPlan};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Output time unit for reported averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Nanoseconds (default)
    Ns,
    /// Microseconds
    Us,
    /// Milliseconds
    Ms,
    /// Seconds
    S,
}

impl TimeUnit {
    /// Textual suffix used in report rows.
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
        }
    }

    /// Convert a nanosecond quantity into this unit.
    pub fn from_nanos(self, nanos: f64) -> f64 {
        match self {
            TimeUnit::Ns => nanos,
            TimeUnit::Us => nanos / 1e3,
            TimeUnit::Ms => nanos / 1e6,
            TimeUnit::S => nanos / 1e9,
        }
    }
}

impl Default for TimeUnit {
    fn default() -> Self {
        TimeUnit::Ns
    }
}

impl FromStr for TimeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ns" => Ok(TimeUnit::Ns),
            "us" => Ok(TimeUnit::Us),
            "ms" => Ok(TimeUnit::Ms),
            "s" => Ok(TimeUnit::S),
            other => Err(ConfigError::UnknownTimeUnit(other.to_string())),
        }
    }
}

/// Suite-wide configuration, immutable during execution.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Number of warmup batches per probe (discarded). Zero is allowed.
    pub warmup_batches: u32,
    /// Minimum wall-clock window of each warmup batch.
    pub warmup_window: Duration,
    /// Number of measured batches per probe. Must be at least one.
    pub measure_batches: u32,
    /// Minimum wall-clock window of each measured batch.
    pub measure_window: Duration,
    /// Run each probe's trial in a freshly spawned worker process.
    pub fork_per_probe: bool,
    /// Unit used by the reporting sink.
    pub time_unit: TimeUnit,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            warmup_batches: 3,
            warmup_window: Duration::from_secs(1),
            measure_batches: 5,
            measure_window: Duration::from_secs(1),
            fork_per_probe: true,
            time_unit: TimeUnit::Ns,
        }
    }
}

impl SuiteConfig {
    /// Validate configuration values before any probe runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.measure_batches == 0 {
            return Err(ConfigError::ZeroMeasureBatches);
        }
        Ok(())
    }

    /// The per-probe trial plan derived from this configuration.
    pub fn plan(&self) -> TrialPlan {
        TrialPlan {
            warmup_batches: self.warmup_batches,
            warmup_window_ns: self.warmup_window.as_nanos() as u64,
            measure_batches: self.measure_batches,
            measure_window_ns: self.measure_window.as_nanos() as u64,
        }
    }
}
