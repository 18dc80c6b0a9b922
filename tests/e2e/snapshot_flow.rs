//! `scantel snapshot` end to end.

use scantel_testkit::fixtures::{proc_stat_basic, proc_stat_short};
use serde_json::Value;
use std::error::Error;
use std::path::Path;
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

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn staged_snapshot_renders_cpu_counters() -> TestResult {
    let temp = tempfile::tempdir()?;
    let stat = path_arg(&proc_stat_basic()?);
    let dir = path_arg(temp.path());
    let output = run_cli(
        &[
            "snapshot", "--dir", &dir, "--prefix", "planner", "--stage", "start", "--proc-stat",
            &stat, "--no-progress",
        ],
        &[],
    )?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let printed = String::from_utf8(output.stdout)?;
    let expected = temp.path().join("planner_start.prom");
    assert_eq!(printed.trim(), expected.to_string_lossy());

    let text = std::fs::read_to_string(&expected)?;
    assert_eq!(
        text,
        "# HELP planner_cpu_user_jiffies_total Aggregate CPU time spent in user mode, in jiffies\n\
         # TYPE planner_cpu_user_jiffies_total counter\n\
         planner_cpu_user_jiffies_total{stage=\"start\"} 10\n\
         # HELP planner_cpu_system_jiffies_total Aggregate CPU time spent in kernel mode, in jiffies\n\
         # TYPE planner_cpu_system_jiffies_total counter\n\
         planner_cpu_system_jiffies_total{stage=\"start\"} 20\n\
         # HELP planner_cpu_iowait_jiffies_total Aggregate CPU time spent waiting for I/O, in jiffies\n\
         # TYPE planner_cpu_iowait_jiffies_total counter\n\
         planner_cpu_iowait_jiffies_total{stage=\"start\"} 30\n"
    );
    Ok(())
}

#[test]
fn env_directory_and_unstaged_file_name() -> TestResult {
    let temp = tempfile::tempdir()?;
    let stat = path_arg(&proc_stat_basic()?);
    let dir = path_arg(temp.path());
    let output = run_cli(
        &["snapshot", "--proc-stat", &stat, "--output", "json"],
        &[("SCANTEL_EXPORTER_DIR", &dir)],
    )?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["status"], "ok");
    assert_eq!(value["collectors"], serde_json::json!(["cpu"]));
    assert_eq!(value["snapshots"][0]["stage"], "");

    let text = std::fs::read_to_string(temp.path().join("scantel.prom"))?;
    assert!(text.contains("scantel_cpu_user_jiffies_total 10\n"));
    assert!(!text.contains("stage="));
    Ok(())
}

#[test]
fn rewriting_a_stage_replaces_the_file_without_temp_leftovers() -> TestResult {
    let temp = tempfile::tempdir()?;
    let stat = path_arg(&proc_stat_basic()?);
    let dir = path_arg(temp.path());
    for _ in 0..2 {
        let output = run_cli(
            &["snapshot", "--dir", &dir, "--stage", "end", "--proc-stat", &stat],
            &[],
        )?;
        assert!(output.status.success());
    }

    let names: Vec<String> = std::fs::read_dir(temp.path())?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    assert_eq!(names, vec!["scantel_end.prom".to_string()]);
    Ok(())
}

#[test]
fn malformed_cpu_source_fails_without_writing() -> TestResult {
    let temp = tempfile::tempdir()?;
    let stat = path_arg(&proc_stat_short()?);
    let dir = path_arg(temp.path());
    let output = run_cli(
        &["snapshot", "--dir", &dir, "--proc-stat", &stat, "--output", "json"],
        &[],
    )?;
    assert_eq!(output.status.code(), Some(1));

    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["error"]["code"], "telemetry:collector_failed");
    assert_eq!(value["error"]["metadata"]["collector"], "cpu");
    assert_eq!(value["error"]["metadata"]["causeCode"], "telemetry:parse");
    assert_eq!(std::fs::read_dir(temp.path())?.count(), 0);
    Ok(())
}

#[test]
fn invalid_stage_is_invalid_input() -> TestResult {
    let temp = tempfile::tempdir()?;
    let stat = path_arg(&proc_stat_basic()?);
    let dir = path_arg(temp.path());
    let output = run_cli(
        &["snapshot", "--dir", &dir, "--stage", "bad stage", "--proc-stat", &stat],
        &[],
    )?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stdout)?.contains("code: core:invalid_input\n"));
    Ok(())
}

#[test]
fn missing_cpu_source_is_reported() -> TestResult {
    let temp = tempfile::tempdir()?;
    let dir = path_arg(temp.path());
    let missing = path_arg(&temp.path().join("absent"));
    let output = run_cli(
        &["snapshot", "--dir", &dir, "--proc-stat", &missing, "--output", "ndjson"],
        &[],
    )?;
    assert!(!output.status.success());

    let line: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(line["type"], "error");
    assert_eq!(line["error"]["metadata"]["causeCode"], "core:not_found");
    Ok(())
}

#[test]
fn json_logs_go_to_stderr() -> TestResult {
    let temp = tempfile::tempdir()?;
    let stat = path_arg(&proc_stat_basic()?);
    let dir = path_arg(temp.path());
    let output = run_cli(
        &["snapshot", "--dir", &dir, "--proc-stat", &stat, "--no-progress"],
        &[("SCANTEL_LOG_FORMAT", "json")],
    )?;
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr)?;
    let events: Vec<Value> = stderr
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert!(events.iter().any(|event| event["event"] == "exporter.init"));
    assert!(events.iter().all(|event| event["fields"]["service"] == "scantel"
        || event.get("fields").is_none()));
    Ok(())
}
