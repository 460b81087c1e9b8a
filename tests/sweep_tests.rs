//! Library-level sweep tests
//!
//! Runs the orchestrator against the in-process mock backend

use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use nightly_sim::backend::{MockBackend, MockConfig};
use nightly_sim::cli::{self, RunConfiguration};
use nightly_sim::orchestrator::SweepOrchestrator;
use nightly_sim::persona::{PersonaLookup, PersonaRegistry};
use nightly_sim::queries::QueryCatalog;
use nightly_sim::report::{self, PersistOutcome, ReportWriter};
use nightly_sim::tiers::{TierRegistry, DEFAULT_ENDPOINT};
use nightly_sim::trial::TrialExecutor;

fn orchestrator(backend: Arc<MockBackend>) -> SweepOrchestrator {
    let personas: Arc<dyn PersonaLookup> = Arc::new(PersonaRegistry::bundled().unwrap());
    let executor = TrialExecutor::new(backend, Arc::new(QueryCatalog::standard()));
    SweepOrchestrator::new(executor, TierRegistry::builtin(DEFAULT_ENDPOINT), personas)
}

fn config_from_args(args: &[&str]) -> RunConfiguration {
    cli::parse(args, &TierRegistry::builtin(DEFAULT_ENDPOINT))
}

/// Drop fields that depend on the clock
fn without_timing(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in ["timestamp", "date", "durationMs", "latencyMs", "averageLatencyMs", "totalDurationMs"] {
                map.remove(key);
            }
            map.values_mut().for_each(without_timing);
        }
        Value::Array(items) => items.iter_mut().for_each(without_timing),
        _ => {}
    }
}

#[tokio::test]
async fn test_single_trial_end_to_end() {
    let backend = Arc::new(MockBackend::new());
    let config = config_from_args(&["--models", "3b", "--maestri", "euclide"]);

    let report = orchestrator(backend).run(&config).await;

    assert_eq!(report.results.len(), 1);
    let summary = &report.results[0].summary;
    assert_eq!(summary.total_tests, 3);
    assert_eq!(summary.passed_tests, 3);
    assert_eq!(summary.failed_tests, 0);
    assert!(summary.passed);
    assert_eq!(report::exit_code(&report), 0);
}

#[tokio::test]
async fn test_default_selection_covers_every_pair() {
    let backend = Arc::new(MockBackend::new());
    let report = orchestrator(backend.clone()).run(&config_from_args(&[])).await;

    // 4 bundled personas x 3 built-in tiers
    assert_eq!(report.results.len(), 12);
    assert_eq!(report.summary.total_simulations, 12);
    assert_eq!(report.summary.passed_simulations, 12);
    assert_eq!(backend.call_count(), 36);
    assert_eq!(report.results[0].maestro_id, "euclide");
    assert_eq!(report.results[0].model_tier, "1b");
    assert_eq!(report.results[11].maestro_id, "simone");
    assert_eq!(report.results[11].model_tier, "8b");
}

#[tokio::test]
async fn test_one_failed_query_fails_the_run() {
    let backend = Arc::new(MockBackend::with_config(MockConfig {
        fail_calls: [4].into_iter().collect(),
        ..Default::default()
    }));
    let config = config_from_args(&["--models", "3b", "--maestri", "euclide,darwin"]);

    let report = orchestrator(backend.clone()).run(&config).await;

    assert_eq!(backend.call_count(), 6);
    assert!(report.results[0].summary.passed);
    let second = &report.results[1].summary;
    assert_eq!(second.total_tests, 3);
    assert_eq!(second.failed_tests, 1);
    assert_eq!(report.summary.failed_simulations, 1);
    assert_eq!(report::exit_code(&report), 1);
}

#[tokio::test]
async fn test_short_answers_fail_every_simulation() {
    let backend = Arc::new(MockBackend::answering("ok"));
    let config = config_from_args(&["--models", "1b", "--maestri", "leonardo"]);

    let report = orchestrator(backend).run(&config).await;

    let results = &report.results[0].test_query_results;
    assert!(results.iter().all(|r| !r.passed));
    assert!(results
        .iter()
        .all(|r| r.safety_violations.iter().any(|v| v.as_str() == "insufficient_response")));
    assert_eq!(report::exit_code(&report), 1);
}

#[tokio::test]
async fn test_dry_run_is_idempotent_and_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let writer = ReportWriter::new(temp.path().join("reports"));
    let config = config_from_args(&["--models", "1b,8b", "--maestri", "darwin", "--dry-run"]);
    assert!(config.dry_run);

    let mut snapshots = Vec::new();
    for _ in 0..2 {
        let report = orchestrator(Arc::new(MockBackend::new())).run(&config).await;
        assert_eq!(report::persist(&report, config.dry_run, &writer), PersistOutcome::DryRun);

        let mut value = serde_json::to_value(&report).unwrap();
        without_timing(&mut value);
        snapshots.push(value);
    }

    assert_eq!(snapshots[0], snapshots[1]);
    assert!(!writer.dir().exists());
}

#[tokio::test]
async fn test_report_round_trips_through_disk() {
    let temp = TempDir::new().unwrap();
    let writer = ReportWriter::new(temp.path());
    let config = config_from_args(&["--models", "3b", "--maestri", "simone"]);

    let report = orchestrator(Arc::new(MockBackend::new())).run(&config).await;
    let outcome = report::persist(&report, false, &writer);

    let path = match outcome {
        PersistOutcome::Written(path) => path,
        other => panic!("expected a written report, got {:?}", other),
    };
    let text = std::fs::read_to_string(&path).unwrap();
    let stored: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(stored["results"][0]["maestroName"], "Simone Barlaam");
    assert_eq!(stored["results"][0]["testQueryResults"].as_array().unwrap().len(), 3);
    assert!(report::render_summary(&report, &PersistOutcome::Written(path)).contains("Passed:   1"));
}
