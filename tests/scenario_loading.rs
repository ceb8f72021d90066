//! Scenario Loading Integration Tests
//!
//! YAML scenario files and scenario directories.

use std::sync::Arc;
use std::time::Duration;

use async_gallery::adapters::NullDisplay;
use async_gallery::core::{Combinator, DemoRunner, Library, Scenario, ScenarioError, TimerSimulator};
use async_gallery::domain::{FailureKind, Latency, Outcome};
use serde_json::json;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

const JITTER_SCENARIO: &str = r#"
name: flaky-mirror
title: Flaky mirror
description: Two mirrors with unpredictable latency
combinator:
  kind: race
steps:
  - name: mirror a
    jitter:
      min_ms: 100
      max_ms: 400
    outcome:
      chance:
        success_rate: 0.5
        error: network_error
        value: a
  - name: mirror b
    duration_ms: 250
    outcome:
      failure:
        server_error: 502
"#;

#[test]
fn test_load_jitter_and_chance() {
    let scenario = assert_ok!(Scenario::from_yaml(JITTER_SCENARIO));

    assert_eq!(scenario.combinator, Combinator::Race);
    assert_eq!(
        scenario.steps[0].latency,
        Latency::Jitter {
            min: Duration::from_millis(100),
            max: Duration::from_millis(400),
        }
    );
    assert!(matches!(
        scenario.steps[0].outcome,
        Outcome::Chance { success_rate, .. } if success_rate == 0.5
    ));
    assert_eq!(
        scenario.steps[1].outcome,
        Outcome::Failure(FailureKind::ServerError(502))
    );
    assert_eq!(scenario.get_step("mirror b").unwrap().latency.nominal(), Duration::from_millis(250));
}

#[test]
fn test_invalid_scenarios_rejected() {
    let cases = [
        // No steps
        "name: empty\ncombinator: { kind: sequential }\nsteps: []\n",
        // Timeout needs exactly one step
        r#"
name: timeout-two
combinator: { kind: timeout, limit_ms: 100 }
steps:
  - { name: a, duration_ms: 10, outcome: { success: 1 } }
  - { name: b, duration_ms: 10, outcome: { success: 2 } }
"#,
        // Negative backoff
        r#"
name: negative
combinator: { kind: retry_with_backoff, max_attempts: 3, base_delay_ms: -1 }
steps:
  - { name: a, duration_ms: 10, outcome: { success: 1 } }
"#,
        // Jitter bounds inverted
        r#"
name: inverted
combinator: { kind: sequential }
steps:
  - { name: a, jitter: { min_ms: 50, max_ms: 10 }, outcome: { success: 1 } }
"#,
        // Success rate out of range
        r#"
name: odds
combinator: { kind: sequential }
steps:
  - { name: a, duration_ms: 10, outcome: { chance: { success_rate: 1.5, error: auth_error } } }
"#,
    ];

    for yaml in cases {
        let err = assert_err!(Scenario::from_yaml(yaml));
        assert!(
            matches!(err, ScenarioError::InvalidConfiguration(_)),
            "expected configuration error, got {:?}",
            err
        );
    }
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let err = assert_err!(Scenario::from_yaml("name: [unclosed"));
    assert!(matches!(err, ScenarioError::Parse(_)));
}

#[test]
fn test_from_file_reports_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.yaml");
    std::fs::write(&path, "name: broken\ncombinator: { kind: race }\nsteps: []\n").unwrap();

    let err = assert_err!(Scenario::from_file(&path));
    assert!(format!("{:#}", err).contains("broken.yaml"));
}

#[test]
fn test_library_loads_directory() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("mirror.yaml"), JITTER_SCENARIO).unwrap();
    std::fs::write(temp.path().join("README.md"), "not a scenario").unwrap();

    let mut library = Library::builtin().unwrap();
    let loaded = assert_ok!(library.load_dir(temp.path()));

    assert_eq!(loaded, 1);
    assert_eq!(library.len(), 13);
    assert_eq!(library.names().last(), Some(&"flaky-mirror"));
}

#[test]
fn test_library_rejects_bad_file() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("bad.yml"), "name: bad\n").unwrap();

    let mut library = Library::default();
    assert_err!(library.load_dir(temp.path()));
}

const DOCUMENTED_SCENARIO: &str = r#"
name: flaky-endpoint
title: Flaky endpoint
description: Retries a flaky call
combinator: { kind: retry_with_backoff, max_attempts: 3, base_delay_ms: 500 }
steps:
  - name: fetch
    duration_ms: 400
    outcome: { flaky: { failures: 2, error: network_error, value: "ok" } }
code: |
  ...
"#;

#[test]
fn test_documented_format_parses() {
    let scenario = assert_ok!(Scenario::from_yaml(DOCUMENTED_SCENARIO));

    assert_eq!(scenario.title, "Flaky endpoint");
    assert_eq!(scenario.code, "...\n");
    assert_eq!(
        scenario.steps[0].outcome,
        Outcome::Flaky {
            failures: 2,
            error: FailureKind::NetworkError,
            value: json!("ok"),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_scenario_file_runs_end_to_end() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("flaky.yaml");
    std::fs::write(&path, DOCUMENTED_SCENARIO).unwrap();

    let scenario = assert_ok!(Scenario::from_file(&path));
    let runner = DemoRunner::new(
        scenario,
        Arc::new(TimerSimulator::with_seed(1)),
        Arc::new(NullDisplay),
    )
    .unwrap();

    let state = runner.run().await;

    assert_eq!(state.result(), Some(&json!("ok")));
    assert_eq!(state.attempt, 3);
    // 3 x 400ms attempts + 1000ms + 2000ms backoff
    let elapsed = state.elapsed.unwrap().as_millis();
    assert!((4200..4300).contains(&elapsed), "elapsed {}ms", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_loaded_failure_settles_run() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("mirror.yaml"), JITTER_SCENARIO).unwrap();

    let mut library = Library::default();
    library.load_dir(temp.path()).unwrap();
    let scenario = library.get("flaky-mirror").unwrap().clone();
    let runner = DemoRunner::new(
        scenario,
        Arc::new(TimerSimulator::with_seed(3)),
        Arc::new(NullDisplay),
    )
    .unwrap();

    let state = runner.run().await;

    assert!(state.is_finished());
    // Mirror b fails at 250ms, so the race never outlasts it
    let elapsed = state.elapsed.unwrap().as_millis();
    assert!((100..260).contains(&elapsed), "elapsed {}ms", elapsed);
}
