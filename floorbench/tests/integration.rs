//! Integration tests for FloorBench
//!
//! These tests run real probe trials in-process with tiny measurement plans
//! and verify the end-to-end path from suite configuration to report output.

use floorbench::{
    build_report_meta, generate_human_report, generate_json_report, registry, Executor, Probe,
    ProbeOutcome, Report, SuiteConfig, TimeUnit, TrialPlan, PROBE_NAMES,
};
use std::time::Duration;

/// A plan that runs exactly one invocation per batch (zero windows).
fn single_shot_plan(measure_batches: u32) -> TrialPlan {
    TrialPlan {
        warmup_batches: 0,
        warmup_window_ns: 0,
        measure_batches,
        measure_window_ns: 0,
    }
}

/// Test the lock probe end to end with a small timed plan
#[test]
fn test_lock_probe_end_to_end() {
    let plan = TrialPlan {
        warmup_batches: 1,
        warmup_window_ns: 1_000_000,
        measure_batches: 2,
        measure_window_ns: 1_000_000,
    };

    let probes = registry()
        .into_iter()
        .filter(|p| p.name() == "lock")
        .collect();
    let outcomes = Executor::new(plan).execute(probes);

    assert_eq!(outcomes.len(), 1);
    let result = outcomes[0].status.as_ref().expect("lock trial failed");
    assert_eq!(result.probe, "lock");
    assert_eq!(result.batch_mean_ns.len(), 2);
    assert!(result.invocations > 0);
    assert!(result.average_ns() > 0.0);
}

/// Test that a zero-window plan runs exactly one invocation per batch
#[test]
fn test_single_shot_average_equals_total() {
    let probes = registry()
        .into_iter()
        .filter(|p| p.name() == "gzip_compress")
        .collect();
    let outcomes = Executor::new(single_shot_plan(1)).execute(probes);

    let result = outcomes[0].status.as_ref().expect("gzip trial failed");
    assert_eq!(result.invocations, 1);
    assert!((result.average_ns() - result.total_ns as f64).abs() < 1e-9);
}

/// Test that the full suite reports rows in registration order
#[test]
fn test_report_preserves_registration_order() {
    let outcomes = Executor::new(single_shot_plan(1)).execute(registry());

    let suite = SuiteConfig::default();
    let rows = outcomes.into_iter().map(ProbeOutcome::into_row).collect();
    let report = Report::new(build_report_meta(&suite), rows, 0.0);

    let reported: Vec<_> = report.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(reported, PROBE_NAMES);
}

/// Test that suite configuration rejects a zero measured-batch count
#[test]
fn test_config_validation() {
    let config = SuiteConfig {
        measure_batches: 0,
        ..Default::default()
    };
    assert!(config.validate().is_err());
    assert!(SuiteConfig::default().validate().is_ok());
}

/// Test that the JSON report round-trips through serde
#[test]
fn test_json_report_round_trips() {
    let probes = registry()
        .into_iter()
        .filter(|p| p.name() == "memory_read")
        .collect();
    let outcomes = Executor::new(single_shot_plan(2)).execute(probes);

    let suite = SuiteConfig {
        time_unit: TimeUnit::Us,
        measure_window: Duration::from_millis(1),
        ..Default::default()
    };
    let rows = outcomes.into_iter().map(ProbeOutcome::into_row).collect();
    let report = Report::new(build_report_meta(&suite), rows, 1.0);

    let json = generate_json_report(&report).unwrap();
    let parsed: Report = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.rows.len(), 1);
    assert_eq!(parsed.rows[0].name, "memory_read");
    assert_eq!(parsed.summary.done, 1);
    assert_eq!(parsed.meta.config.time_unit, TimeUnit::Us);
}

/// Test that the human sink renders every row, including failures
#[test]
fn test_human_report_rows() {
    let outcomes = Executor::new(single_shot_plan(1)).execute(registry());

    let suite = SuiteConfig::default();
    let mut rows: Vec<_> = outcomes.into_iter().map(ProbeOutcome::into_row).collect();
    rows.push(floorbench::ProbeRow::failed(
        "synthetic_probe",
        "measurement",
        "injected failure",
    ));
    let report = Report::new(build_report_meta(&suite), rows, 0.0);

    let output = generate_human_report(&report);
    for name in PROBE_NAMES {
        assert!(output.contains(name), "missing row for {}", name);
    }
    assert!(output.contains("FAILED: injected failure"));
}
