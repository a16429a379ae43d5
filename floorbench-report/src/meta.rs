//! System Metadata Collection
//!
//! Collects system and git information for report metadata. Linux-specific
//! data (CPU model, memory) gracefully degrades on other platforms,
//! returning "Unknown" or 0 values.

use crate::{ReportConfig, ReportMeta, SystemInfo};
use chrono::Utc;
use floorbench_core::SuiteConfig;

/// Build report metadata including system info and git details
pub fn build_report_meta(config: &SuiteConfig) -> ReportMeta {
    let git_commit = git_output(&["rev-parse", "HEAD"]);
    let git_branch = git_output(&["rev-parse", "--abbrev-ref", "HEAD"]);

    let system = SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: get_cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: num_cpus(),
        memory_gb: get_memory_gb().unwrap_or(0.0),
    };

    ReportMeta {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        git_commit,
        git_branch,
        system,
        config: ReportConfig {
            warmup_batches: config.warmup_batches,
            warmup_window_ns: config.warmup_window.as_nanos() as u64,
            measure_batches: config.measure_batches,
            measure_window_ns: config.measure_window.as_nanos() as u64,
            fork_per_probe: config.fork_per_probe,
            time_unit: config.time_unit,
        },
    }
}

fn git_output(args: &[&str]) -> Option<String> {
    std::process::Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
}

/// Get CPU model name from /proc/cpuinfo (Linux only)
fn get_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Get number of available CPU cores
fn num_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

/// Get total system memory in GB (Linux only)
fn get_memory_gb() -> Option<f64> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("MemTotal"))
                    .and_then(|l| {
                        l.split_whitespace()
                            .nth(1)
                            .and_then(|s| s.parse::<u64>().ok())
                    })
                    .map(|kb| kb as f64 / 1024.0 / 1024.0)
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_captures_config() {
        let config = SuiteConfig {
            measure_batches: 7,
            fork_per_probe: false,
            ..Default::default()
        };
        let meta = build_report_meta(&config);

        assert_eq!(meta.config.measure_batches, 7);
        assert!(!meta.config.fork_per_probe);
        assert_eq!(meta.config.warmup_window_ns, 1_000_000_000);
        assert!(meta.system.cpu_cores >= 1);
        assert!(!meta.version.is_empty());
    }
}
