//! `parse-attrs` command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, ndjson_line, ndjson_summary, pretty_json};
use scantel_domain::{Attribute, parse_attribute_string};
use serde_json::Value;

/// Decode a packed `k=v;k=v` string and print the pairs in order.
pub fn run_parse_attrs(mode: OutputMode, packed: &str) -> Result<CliOutput, CliError> {
    let attributes = parse_attribute_string(packed);

    let stdout = if mode.is_ndjson() {
        let mut out = String::new();
        for attribute in &attributes {
            out.push_str(&ndjson_line(&serde_json::json!({
                "type": "attribute",
                "key": attribute.key,
                "value": attribute.value,
            }))?);
        }
        out.push_str(&ndjson_summary(
            "ok",
            "attributes",
            Some(serde_json::json!({ "count": attributes.len() })),
        ));
        out
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "attributes": attributes.iter().map(attribute_value).collect::<Vec<_>>(),
        }))?
    } else if attributes.is_empty() {
        "status: ok\nattributes: none\n".to_string()
    } else {
        let mut out = String::from("status: ok\n");
        for attribute in &attributes {
            out.push_str(&attribute.key);
            out.push('=');
            out.push_str(&attribute.value);
            out.push('\n');
        }
        out
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn attribute_value(attribute: &Attribute) -> Value {
    serde_json::json!({ "key": attribute.key, "value": attribute.value })
}
