//! Human-Readable Output
//!
//! Terminal formatting for a suite report: one aligned row per probe in
//! registration order, averages converted into the configured time unit.

use crate::{ProbeStatus, Report};

/// Format a report for human-readable terminal display
pub fn generate_human_report(report: &Report) -> String {
    let unit = report.meta.config.time_unit;
    let mut output = String::new();

    output.push('\n');
    output.push_str("FloorBench Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    let name_width = report
        .rows
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(16);

    for row in &report.rows {
        match row.status {
            ProbeStatus::Done => {
                // measurement is always present on a Done row
                if let Some(m) = &row.measurement {
                    output.push_str(&format!(
                        "{:<width$}  {:>12.2} {}  \u{00b1}{:.2} (n={})\n",
                        row.name,
                        unit.from_nanos(m.average_ns),
                        unit.suffix(),
                        unit.from_nanos(m.std_dev_ns),
                        m.batches,
                        width = name_width
                    ));
                }
            }
            ProbeStatus::Failed => {
                let reason = row
                    .failure
                    .as_ref()
                    .map(|f| f.message.as_str())
                    .unwrap_or("unknown error");
                output.push_str(&format!(
                    "{:<width$}  FAILED: {}\n",
                    row.name,
                    reason,
                    width = name_width
                ));
            }
        }
    }

    output.push('\n');
    output.push_str(&format!(
        "{} probes: {} done, {} failed  ({:.1} ms)\n",
        report.summary.total_probes,
        report.summary.done,
        report.summary.failed,
        report.summary.total_duration_ms
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_report_meta, ProbeRow, Report};
    use floorbench_core::{SuiteConfig, TimeUnit, TrialResult};

    fn sample_report(time_unit: TimeUnit) -> Report {
        let config = SuiteConfig {
            time_unit,
            ..Default::default()
        };
        let result = TrialResult {
            probe: "memory_read".to_string(),
            invocations: 1_000,
            total_ns: 42_000_000,
            batch_mean_ns: vec![42_000.0; 5],
        };
        let rows = vec![
            ProbeRow::done(&result),
            ProbeRow::failed("net_roundtrip", "measurement", "socket error"),
        ];
        Report::new(build_report_meta(&config), rows, 10.0)
    }

    #[test]
    fn test_done_row_format() {
        let output = generate_human_report(&sample_report(TimeUnit::Ns));
        assert!(output.contains("memory_read"));
        assert!(output.contains("42000.00 ns"));
        assert!(output.contains("(n=5)"));
    }

    #[test]
    fn test_failed_row_format() {
        let output = generate_human_report(&sample_report(TimeUnit::Ns));
        assert!(output.contains("net_roundtrip"));
        assert!(output.contains("FAILED: socket error"));
    }

    #[test]
    fn test_unit_conversion() {
        let output = generate_human_report(&sample_report(TimeUnit::Us));
        assert!(output.contains("42.00 us"));
        assert!(!output.contains("42000.00 ns"));
    }

    #[test]
    fn test_summary_line() {
        let output = generate_human_report(&sample_report(TimeUnit::Ns));
        assert!(output.contains("2 probes: 1 done, 1 failed"));
    }
}
