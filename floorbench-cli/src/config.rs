//! Configuration loading from floorbench.toml
//!
//! Suite configuration can be specified in a `floorbench.toml` file in the
//! project root. The file is discovered by walking up from the current
//! directory; CLI flags override anything it sets.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// FloorBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FloorConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration for probe execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Warmup batches per probe (discarded)
    #[serde(default = "default_warmup_batches")]
    pub warmup_batches: u32,
    /// Minimum wall-clock window of each warmup batch (e.g., "1s")
    #[serde(default = "default_window")]
    pub warmup_window: String,
    /// Measured batches per probe
    #[serde(default = "default_measure_batches")]
    pub measure_batches: u32,
    /// Minimum wall-clock window of each measured batch (e.g., "1s")
    #[serde(default = "default_window")]
    pub measure_window: String,
    /// Run each probe in a freshly spawned worker process
    #[serde(default = "default_fork")]
    pub fork: bool,
    /// Timeout for a single probe's trial (e.g., "60s", "5m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Time unit for reported averages: "ns", "us", "ms", or "s"
    #[serde(default = "default_time_unit")]
    pub time_unit: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            warmup_batches: default_warmup_batches(),
            warmup_window: default_window(),
            measure_batches: default_measure_batches(),
            measure_window: default_window(),
            fork: default_fork(),
            timeout: default_timeout(),
            time_unit: default_time_unit(),
        }
    }
}

fn default_warmup_batches() -> u32 {
    3
}
fn default_measure_batches() -> u32 {
    5
}
fn default_window() -> String {
    "1s".to_string()
}
fn default_fork() -> bool {
    true
}
fn default_timeout() -> String {
    "60s".to_string()
}
fn default_time_unit() -> String {
    "ns".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Output file path (stdout when unset)
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            file: None,
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl FloorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("floorbench.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# FloorBench Configuration

[runner]
# Warmup batches per probe (discarded)
warmup_batches = 3
# Minimum wall-clock window of each warmup batch
warmup_window = "1s"
# Measured batches per probe
measure_batches = 5
# Minimum wall-clock window of each measured batch
measure_window = "1s"
# Run each probe in a freshly spawned worker process
fork = true
# Timeout for a single probe's trial
timeout = "60s"
# Time unit for reported averages: ns, us, ms, s
time_unit = "ns"

[output]
# Default output format: human or json
format = "human"
# Output file path (uncomment to enable)
# file = "floorbench.json"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "1s", "500ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FloorConfig::default();
        assert_eq!(config.runner.warmup_batches, 3);
        assert_eq!(config.runner.measure_batches, 5);
        assert_eq!(config.runner.warmup_window, "1s");
        assert!(config.runner.fork);
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(FloorConfig::parse_duration("1s").unwrap(), 1_000_000_000);
        assert_eq!(FloorConfig::parse_duration("500ms").unwrap(), 500_000_000);
        assert_eq!(FloorConfig::parse_duration("100us").unwrap(), 100_000);
        assert_eq!(FloorConfig::parse_duration("1000ns").unwrap(), 1000);
        assert_eq!(FloorConfig::parse_duration("2m").unwrap(), 120_000_000_000);
        assert_eq!(FloorConfig::parse_duration("1.5s").unwrap(), 1_500_000_000);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            warmup_batches = 1
            measure_window = "250ms"
            fork = false
        "#;

        let config: FloorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.warmup_batches, 1);
        assert_eq!(config.runner.measure_window, "250ms");
        assert!(!config.runner.fork);
        // Defaults should still apply
        assert_eq!(config.runner.measure_batches, 5);
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_default_toml_parses() {
        let default_toml = FloorConfig::default_toml();
        let config: FloorConfig = toml::from_str(&default_toml).unwrap();
        assert_eq!(config.runner.measure_batches, 5);
        assert_eq!(config.runner.timeout, "60s");
    }
}
