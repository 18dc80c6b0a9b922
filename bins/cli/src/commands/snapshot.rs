//! `snapshot` command handler.

use super::{CommandEnv, error_output};
use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, log_info, ndjson_line, ndjson_summary, pretty_json};
use scantel_adapters::host::ProcStatReader;
use scantel_infra::{TelemetryContext, load_effective_config};
use scantel_shared::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Flags for one snapshot run.
#[derive(Debug, Default)]
pub struct SnapshotInput<'a> {
    /// Config file path.
    pub config: Option<&'a Path>,
    /// Overrides `exporter.directory`.
    pub directory: Option<&'a str>,
    /// Overrides `exporter.filePrefix`.
    pub prefix: Option<&'a str>,
    /// Stages to write, in order. Empty means one unstaged snapshot.
    pub stages: &'a [String],
    /// Alternate CPU counter file; defaults to `/proc/stat`.
    pub proc_stat: Option<&'a Path>,
}

struct Written {
    paths: Vec<(String, PathBuf)>,
    collectors: Vec<String>,
}

/// Write one resource snapshot per requested stage.
pub fn run_snapshot(
    mode: OutputMode,
    env: &CommandEnv,
    input: &SnapshotInput<'_>,
) -> std::result::Result<CliOutput, CliError> {
    let written = match write_snapshots(env, input) {
        Ok(written) => written,
        Err(error) => return Ok(error_output(mode, &error)),
    };

    let mut stderr = String::new();
    for (stage, path) in &written.paths {
        let label = if stage.is_empty() { "(none)" } else { stage };
        log_info(
            &mut stderr,
            &format!("stage {label} written to {}", path.display()),
            mode.no_progress,
        );
    }

    let snapshots: Vec<serde_json::Value> = written
        .paths
        .iter()
        .map(|(stage, path)| {
            serde_json::json!({ "stage": stage, "path": path.to_string_lossy() })
        })
        .collect();

    let stdout = if mode.is_ndjson() {
        let mut out = String::new();
        for snapshot in &snapshots {
            let mut line = serde_json::json!({ "type": "snapshot" });
            if let (Some(line), Some(fields)) = (line.as_object_mut(), snapshot.as_object()) {
                line.extend(fields.clone());
            }
            out.push_str(&ndjson_line(&line)?);
        }
        out.push_str(&ndjson_summary(
            "ok",
            "snapshot",
            Some(serde_json::json!({
                "count": snapshots.len(),
                "collectors": written.collectors,
            })),
        ));
        out
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "snapshots": snapshots,
            "collectors": written.collectors,
        }))?
    } else {
        let mut out = String::new();
        for (_, path) in &written.paths {
            out.push_str(&path.to_string_lossy());
            out.push('\n');
        }
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn write_snapshots(env: &CommandEnv, input: &SnapshotInput<'_>) -> Result<Written> {
    let config = load_effective_config(&env.vars, input.config)?;
    let mut exporter_config = config.exporter().clone();
    if let Some(directory) = input.directory {
        exporter_config.directory = directory.to_string();
    }
    if let Some(prefix) = input.prefix {
        exporter_config.file_prefix = prefix.to_string();
    }

    let reader = input
        .proc_stat
        .map_or_else(ProcStatReader::system, ProcStatReader::new);
    let context = TelemetryContext::new(Arc::clone(&env.logger));
    let exporter = context.init_exporter_with_cpu(&exporter_config, Arc::new(reader))?;

    let unstaged = [String::new()];
    let stages = if input.stages.is_empty() {
        &unstaged[..]
    } else {
        input.stages
    };

    let mut paths = Vec::with_capacity(stages.len());
    for stage in stages {
        let path = exporter.write_snapshot(stage)?;
        paths.push((stage.trim().to_string(), path));
    }
    let collectors = exporter.collector_names();

    context.exporters().shutdown()?;
    Ok(Written { paths, collectors })
}
