//! Info command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, ndjson_summary, pretty_json};
use scantel_app::{app_crate_version, domain_instrument_specs};
use scantel_infra::infra_crate_version;
use serde_json::Value;

struct BuildInfo {
    name: &'static str,
    version: &'static str,
    app: &'static str,
    infra: &'static str,
    otlp: bool,
}

const fn build_info() -> BuildInfo {
    BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        app: app_crate_version(),
        infra: infra_crate_version(),
        otlp: cfg!(feature = "otlp"),
    }
}

/// Run the info command.
pub fn run_info(mode: OutputMode) -> Result<CliOutput, CliError> {
    let build = build_info();

    let stdout = if mode.is_ndjson() {
        ndjson_summary("ok", "info", Some(info_payload(&build)))
    } else if mode.is_json() {
        let mut payload = info_payload(&build);
        if let Value::Object(map) = &mut payload {
            map.insert("status".to_string(), Value::from("ok"));
        }
        pretty_json(&payload)?
    } else {
        format_info_text(&build)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_info_text(build: &BuildInfo) -> String {
    let mut out = format!(
        "status: ok\nname: {}\nversion: {}\napp: {}\ninfra: {}\notlp: {}\ninstruments:\n",
        build.name,
        build.version,
        build.app,
        build.infra,
        if build.otlp { "enabled" } else { "disabled" },
    );
    for spec in domain_instrument_specs() {
        out.push_str(&format!("  {} ({}, {})\n", spec.name, spec.kind, spec.unit));
    }
    out
}

fn info_payload(build: &BuildInfo) -> Value {
    let instruments: Vec<Value> = domain_instrument_specs()
        .iter()
        .map(|spec| {
            serde_json::json!({
                "name": spec.name.as_str(),
                "kind": spec.kind,
                "unit": &*spec.unit,
                "description": &*spec.description,
            })
        })
        .collect();
    serde_json::json!({
        "build": {
            "name": build.name,
            "version": build.version,
            "appVersion": build.app,
            "infraVersion": build.infra,
            "otlp": build.otlp,
        },
        "instruments": instruments,
    })
}
