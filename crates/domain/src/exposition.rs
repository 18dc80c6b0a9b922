//! Text exposition rendering.
//!
//! Each metric renders as three lines:
//!
//! ```text
//! # HELP <name> <help>
//! # TYPE <name> <counter|gauge>
//! <name>{<k>="<v>",...} <value>
//! ```
//!
//! Labels are emitted sorted by key. A non-empty stage is merged in as the
//! `stage` label and replaces any collector-supplied `stage`.

use crate::metric::{Labels, Metric};
use crate::primitives::Stage;
use std::fmt::Write as _;

/// Render a full snapshot for the given stage.
pub fn render_exposition(metrics: &[Metric], stage: &Stage) -> String {
    let mut out = String::new();
    for metric in metrics {
        let mut labels = metric.labels.clone();
        if !stage.is_none() {
            labels.insert("stage".to_string(), stage.as_str().to_string());
        }
        write_metric(&mut out, metric, &labels);
    }
    out
}

fn write_metric(out: &mut String, metric: &Metric, labels: &Labels) {
    // Writing into a String cannot fail.
    let _ = writeln!(out, "# HELP {} {}", metric.name, escape_help(&metric.help));
    let _ = writeln!(out, "# TYPE {} {}", metric.name, metric.kind);
    out.push_str(&metric.name);
    write_labels(out, labels);
    out.push(' ');
    out.push_str(&format_sample_value(metric.value));
    out.push('\n');
}

fn write_labels(out: &mut String, labels: &Labels) {
    if labels.is_empty() {
        return;
    }
    out.push('{');
    for (index, (key, value)) in labels.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_label_value(value));
        out.push('"');
    }
    out.push('}');
}

/// Escape a label value (`\`, `"`, newline).
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Escape HELP text (`\`, newline).
pub fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Shortest decimal form: `20` for integral values, `NaN`, `+Inf`, `-Inf`.
pub fn format_sample_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else {
        value.to_string()
    }
}
