#![warn(missing_docs)]
//! FloorBench Report
//!
//! Report data model and output sinks:
//! - Human (fixed-width terminal rows)
//! - JSON (machine-readable)
//!
//! Rows appear in probe registration order; a failed probe keeps its slot
//! with a FAILED marker instead of being dropped from the report.

mod human;
mod json;
mod meta;
mod report;

pub use human::generate_human_report;
pub use json::generate_json_report;
pub use meta::build_report_meta;
pub use report::{
    FailureInfo, Measurement, ProbeRow, ProbeStatus, Report, ReportConfig, ReportMeta,
    ReportSummary, SystemInfo,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Machine-readable JSON
    Json,
    /// Human-readable terminal output
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
