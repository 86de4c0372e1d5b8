use chrono::{DateTime, Local};
use colored::Colorize;
use serde_json::{Map, Value};

use crate::record::Severity;
use crate::serializer;
use crate::value::LogValue;

/// Placeholder printed in dev mode when context cannot be converted.
pub const UNSERIALIZABLE_PLACEHOLDER: &str = "<unserializable context>";

/// Render a production record as one compact JSON line.
///
/// The returned string carries no terminator; the facade owns the
/// write boundary.
pub fn json_line(record: &Map<String, Value>) -> String {
    serde_json::to_string(record).unwrap_or_else(|_| {
        // Unreachable for string-keyed maps of JSON values.
        String::from("{\"message\":\"record encoding failed\"}")
    })
}

/// Render the development line: bracketed local timestamp, colorized
/// fixed-width severity label, message, and (when present) the
/// pretty-printed context.
pub fn dev_line(
    severity: Severity,
    message: &str,
    context: Option<&LogValue>,
    now: DateTime<Local>,
) -> String {
    let stamp = now.format("%Y-%m-%d %H:%M:%S%.3f");
    let label = severity_label(severity);
    let mut line = format!("[{stamp}] {label} {message}");

    if let Some(value) = context {
        let pretty = match serializer::to_json(value) {
            Ok(json) => match serde_json::to_string_pretty(&json) {
                Ok(text) => emphasize_scalars(&text),
                Err(_) => UNSERIALIZABLE_PLACEHOLDER.to_string(),
            },
            Err(_) => UNSERIALIZABLE_PLACEHOLDER.to_string(),
        };
        line.push(' ');
        line.push_str(&pretty);
    }

    line
}

fn severity_label(severity: Severity) -> String {
    let padded = format!("{:<5}", severity.label());
    match severity {
        Severity::Debug => padded.blue(),
        Severity::Info => padded.green(),
        Severity::Warn => padded.yellow(),
        Severity::Error => padded.red(),
        Severity::Fatal => padded.magenta(),
    }
    .to_string()
}

/// Colorize scalar values in pretty-printed JSON. The value after a
/// key (or a bare array element) is emphasized; key names and opening
/// braces/brackets stay unmarked.
fn emphasize_scalars(pretty: &str) -> String {
    pretty
        .lines()
        .map(emphasize_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn emphasize_line(line: &str) -> String {
    if let Some((head, tail)) = split_entry(line) {
        if tail.starts_with('{') || tail.starts_with('[') {
            return line.to_string();
        }
        let (value, comma) = split_comma(tail);
        return format!("{head}{}{comma}", value.cyan());
    }

    let trimmed = line.trim_start();
    if trimmed.is_empty() || matches!(trimmed.chars().next(), Some('{' | '[' | '}' | ']')) {
        return line.to_string();
    }

    // Bare array element.
    let indent = &line[..line.len() - trimmed.len()];
    let (value, comma) = split_comma(trimmed);
    format!("{indent}{}{comma}", value.cyan())
}

// Splits `"key": value` lines into the key part (kept plain) and the
// value part.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    if !line.trim_start().starts_with('"') {
        return None;
    }
    let idx = line.find("\": ")?;
    Some((&line[..idx + 3], &line[idx + 3..]))
}

fn split_comma(value: &str) -> (&str, &str) {
    match value.strip_suffix(',') {
        Some(stripped) => (stripped, ","),
        None => (value, ""),
    }
}
