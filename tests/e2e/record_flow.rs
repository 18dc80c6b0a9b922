//! `scantel record` and `scantel parse-attrs` end to end.

use serde_json::Value;
use std::error::Error;
use std::process::{Command, Output};

type TestResult = Result<(), Box<dyn Error>>;

fn run_cli(args: &[&str]) -> std::io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_scantel"));
    command.args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("SCANTEL_") {
            command.env_remove(key);
        }
    }
    command.output()
}

#[test]
fn counter_values_accumulate_per_series() -> TestResult {
    let output = run_cli(&[
        "record",
        "counter",
        "--name",
        "scantel.catalog.requests",
        "--value",
        "2",
        "--value",
        "5",
        "--attrs",
        "op=load_table; catalog = rest",
        "--no-progress",
    ])?;
    assert!(output.status.success());

    let text = String::from_utf8(output.stdout)?;
    assert!(text.contains("# TYPE scantel_catalog_requests counter\n"));
    assert!(text.contains("scantel_catalog_requests{catalog=\"rest\",op=\"load_table\"} 7\n"));
    Ok(())
}

#[test]
fn histogram_json_lines_redact_secret_attributes() -> TestResult {
    let output = run_cli(&[
        "record",
        "histogram",
        "--name",
        "scan.latency",
        "--value",
        "12.5",
        "--attrs",
        "api_token=abc123;zone=eu",
        "--backend",
        "json",
        "--output",
        "ndjson",
    ])?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert!(!stdout.contains("abc123"));
    let lines: Vec<Value> = stdout
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    let [metric, summary] = lines.as_slice() else {
        return Err(format!("expected 2 lines, got {}", lines.len()).into());
    };
    assert_eq!(metric["metricType"], "histogram");
    assert_eq!(metric["value"], 12.5);
    assert_eq!(metric["attributes"]["zone"], "eu");
    assert_eq!(summary["type"], "summary");
    Ok(())
}

#[test]
fn negative_counter_delta_exits_two() -> TestResult {
    let output = run_cli(&[
        "record", "counter", "--name", "bytes", "--value", "-4", "--output", "json",
    ])?;
    assert_eq!(output.status.code(), Some(2));

    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["code"], "core:invalid_input");
    assert_eq!(value["error"]["metadata"]["delta"], "-4");
    Ok(())
}

#[test]
fn non_numeric_value_exits_two() -> TestResult {
    let output = run_cli(&["record", "histogram", "--name", "x", "--value", "fast"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr)?.starts_with("error: invalid input:"));
    Ok(())
}

#[test]
fn parse_attrs_keeps_order_and_drops_empty_keys() -> TestResult {
    let output = run_cli(&["parse-attrs", " b = 2 ;a=1;;=z;flag", "--output", "json"])?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        value["attributes"],
        serde_json::json!([
            { "key": "b", "value": "2" },
            { "key": "a", "value": "1" },
            { "key": "flag", "value": "" },
        ])
    );
    Ok(())
}
