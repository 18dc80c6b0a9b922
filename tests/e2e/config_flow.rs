//! `scantel config` and `scantel info` end to end.

use scantel_testkit::fixtures::fixture_path;
use serde_json::Value;
use std::error::Error;
use std::process::{Command, Output};

type TestResult = Result<(), Box<dyn Error>>;

fn run_cli(args: &[&str], env: &[(&str, &str)]) -> std::io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_scantel"));
    command.args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("SCANTEL_") {
            command.env_remove(key);
        }
    }
    command.envs(env.iter().copied());
    command.output()
}

#[test]
fn show_merges_file_and_env() -> TestResult {
    let path = fixture_path("config/telemetry.toml")?;
    let path = path.to_string_lossy();
    let output = run_cli(
        &["config", "show", "--path", &path, "--output", "json"],
        &[("SCANTEL_SERVICE_NAME", "planner-canary")],
    )?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout)?;
    let config = &value["effectiveConfig"];
    assert_eq!(config["metrics"]["serviceName"], "planner-canary");
    assert_eq!(config["metrics"]["serviceVersion"], "2.4.0");
    assert_eq!(config["metrics"]["collectionIntervalMs"], 5000);
    assert_eq!(config["exporter"]["filePrefix"], "planner");
    Ok(())
}

#[test]
fn check_output_is_deterministic() -> TestResult {
    let first = run_cli(&["config", "check", "--output", "json"], &[])?;
    let second = run_cli(&["config", "check", "--output", "json"], &[])?;
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    Ok(())
}

#[test]
fn unsupported_version_exits_two() -> TestResult {
    let path = fixture_path("config/unsupported_version.json")?;
    let path = path.to_string_lossy();
    let output = run_cli(&["config", "check", "--path", &path, "--output", "json"], &[])?;
    assert_eq!(output.status.code(), Some(2));

    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["error"]["kind"], "expected");
    Ok(())
}

#[test]
fn missing_config_file_is_invalid_input() -> TestResult {
    let temp = tempfile::tempdir()?;
    let missing = temp.path().join("nope.toml");
    let missing = missing.to_string_lossy();
    let output = run_cli(&["config", "check", "--path", &missing], &[])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stdout)?.contains("code: config:config_file_not_found\n"));
    Ok(())
}

#[test]
fn info_lists_domain_instruments() -> TestResult {
    let output = run_cli(&["info", "--output", "json"], &[])?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout)?;
    let names: Vec<&str> = value["instruments"]
        .as_array()
        .map(|items| items.iter().filter_map(|item| item["name"].as_str()).collect())
        .unwrap_or_default();
    assert!(names.contains(&"scantel.catalog.request.duration_ms"));
    assert!(names.contains(&"scantel.scan.plan.transfer.bytes"));
    Ok(())
}
