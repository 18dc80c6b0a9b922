//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{
    Backend, CommandEnv, RecordInput, RecordKind, SnapshotInput, run_config_check,
    run_config_show, run_info, run_parse_attrs, run_record, run_snapshot,
};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use scantel_infra::{LoggingSettings, build_logger, init_tracing};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;

const ENV_PREFIX: &str = "SCANTEL_";

#[derive(Debug, Parser)]
#[command(
    name = "scantel",
    version,
    about = "Scan-pipeline telemetry CLI",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show build details and the domain instrument catalog.
    Info,
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Write resource snapshots (Prometheus text) to the exporter directory.
    Snapshot {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Snapshot directory (overrides `exporter.directory`).
        #[arg(long)]
        dir: Option<String>,
        /// File and metric prefix (overrides `exporter.filePrefix`).
        #[arg(long)]
        prefix: Option<String>,
        /// Stage label; repeat to write one snapshot per stage.
        #[arg(long = "stage")]
        stages: Vec<String>,
        /// CPU counter file to read instead of `/proc/stat`.
        #[arg(long)]
        proc_stat: Option<PathBuf>,
    },
    /// Record measurements through the metrics facade.
    Record {
        /// Instrument flavor.
        #[arg(value_enum)]
        kind: RecordKind,
        /// Instrument name.
        #[arg(long)]
        name: String,
        /// Value to record; repeat to record several.
        #[arg(long = "value", allow_negative_numbers = true)]
        values: Vec<String>,
        /// Packed attributes, e.g. `catalog=rest;op=load_table`.
        #[arg(long)]
        attrs: Option<String>,
        /// Destination provider.
        #[arg(long, value_enum, default_value = "memory")]
        backend: Backend,
        /// Optional config file path (JSON/TOML), used by the OTLP backend.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Decode a packed `k=v;k=v` attribute string.
    ParseAttrs {
        /// Packed attribute string.
        packed: String,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Validate config loading, merging, and normalization.
    Check {
        /// Optional config file path (JSON/TOML).
        #[arg(long = "config", visible_alias = "path")]
        path: Option<PathBuf>,
    },
    /// Show the effective config after applying overrides.
    Show {
        /// Optional config file path (JSON/TOML).
        #[arg(long = "config", visible_alias = "path")]
        path: Option<PathBuf>,
    },
}

#[derive(Debug)]
pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    let settings = LoggingSettings::from_std_env();
    init_tracing(&settings);
    let env = CommandEnv {
        vars: collect_scoped_env(ENV_PREFIX),
        logger: build_logger(&settings),
    };

    match run(&cli.command, mode, &env) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode, env: &CommandEnv) -> Result<CliOutput, CliError> {
    match command {
        Commands::Info => run_info(mode),
        Commands::Config { command } => match command {
            ConfigCommands::Check { path } => run_config_check(mode, env, path.as_deref()),
            ConfigCommands::Show { path } => run_config_show(mode, env, path.as_deref()),
        },
        Commands::Snapshot {
            config,
            dir,
            prefix,
            stages,
            proc_stat,
        } => run_snapshot(
            mode,
            env,
            &SnapshotInput {
                config: config.as_deref(),
                directory: dir.as_deref(),
                prefix: prefix.as_deref(),
                stages,
                proc_stat: proc_stat.as_deref(),
            },
        ),
        Commands::Record {
            kind,
            name,
            values,
            attrs,
            backend,
            config,
        } => run_record(
            mode,
            env,
            &RecordInput {
                kind: *kind,
                name,
                values,
                attrs: attrs.as_deref(),
                backend: *backend,
                config: config.as_deref(),
            },
        ),
        Commands::ParseAttrs { packed } => run_parse_attrs(mode, packed),
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

fn collect_scoped_env(prefix: &str) -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(prefix))
        .collect()
}
