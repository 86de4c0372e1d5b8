use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::config::{LogFormat, LoggerConfig};
use crate::inferred::SystemInfoSource;
use crate::serializer::{self, ContextError};
use crate::value::LogValue;

/// Severity of a single log call. All five are always emitted; the
/// ordering is a display convention, not a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Upper-cased label as it appears in records and dev lines.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Suffix appended to the message of a degraded record.
pub const DEGRADED_SUFFIX: &str = " [unserializable context]";

/// Reserved field holding array and scalar contexts.
const DATA_KEY: &str = "data";

/// Assemble the canonical record for one production log call.
///
/// Merge rules for `context`:
/// - object: its keys overlay the fixed fields, last write wins,
///   including on `@timestamp`, `message` and the severity field;
/// - array or scalar: stored verbatim under `data`;
/// - `None`: nothing is added.
///
/// When the context cannot be converted, a degraded record is returned
/// instead: fixed schema fields only (with a freshly captured
/// `inferred` snapshot, if enabled) and the message suffixed with
/// [`DEGRADED_SUFFIX`]. This function never fails and never panics, so
/// a log line is produced for every call.
pub fn build(
    severity: Severity,
    message: &str,
    context: Option<&LogValue>,
    config: &LoggerConfig,
    now: DateTime<Local>,
    source: &dyn SystemInfoSource,
) -> Map<String, Value> {
    match assemble(severity, message, context, config, now, source) {
        Ok(record) => record,
        Err(_) => {
            let mut degraded = fixed_fields(severity, config, now, source);
            degraded.insert(
                "message".to_string(),
                Value::String(format!("{message}{DEGRADED_SUFFIX}")),
            );
            degraded
        }
    }
}

fn assemble(
    severity: Severity,
    message: &str,
    context: Option<&LogValue>,
    config: &LoggerConfig,
    now: DateTime<Local>,
    source: &dyn SystemInfoSource,
) -> Result<Map<String, Value>, ContextError> {
    let mut record = fixed_fields(severity, config, now, source);
    record.insert("message".to_string(), Value::String(message.to_string()));

    match context {
        None => {}
        Some(value) => match serializer::to_json(value)? {
            Value::Object(fields) => {
                for (key, field) in fields {
                    record.insert(key, field);
                }
            }
            other => {
                record.insert(DATA_KEY.to_string(), other);
            }
        },
    }

    Ok(record)
}

fn fixed_fields(
    severity: Severity,
    config: &LoggerConfig,
    now: DateTime<Local>,
    source: &dyn SystemInfoSource,
) -> Map<String, Value> {
    let mut record = Map::new();
    let hostname = source.hostname();

    match config.format {
        LogFormat::Datadog => {
            record.insert(
                "@timestamp".to_string(),
                Value::String(datadog_timestamp(now)),
            );
            record.insert(
                "status".to_string(),
                Value::String(severity.label().to_string()),
            );
            record.insert(
                "service".to_string(),
                Value::String(config.service_name.clone()),
            );
            record.insert("hostname".to_string(), Value::String(hostname));
            // Schema-identifying literal expected by the intake side.
            record.insert("ddsource".to_string(), Value::String("node".to_string()));
        }
        LogFormat::Elasticsearch => {
            record.insert(
                "@timestamp".to_string(),
                Value::String(
                    now.with_timezone(&Utc)
                        .to_rfc3339_opts(SecondsFormat::Millis, true),
                ),
            );
            record.insert(
                "level".to_string(),
                Value::String(severity.label().to_string()),
            );
            record.insert(
                "service".to_string(),
                json!({ "name": config.service_name.clone() }),
            );
            record.insert("host".to_string(), json!({ "name": hostname }));
        }
    }

    if config.include_system_info {
        record.insert("inferred".to_string(), source.snapshot());
    }

    record
}

/// Local-time timestamp with a nanosecond-width fraction and a signed
/// `HH:MM` offset suffix. Only millisecond resolution is real; the low
/// six digits are always zero.
fn datadog_timestamp(now: DateTime<Local>) -> String {
    format!(
        "{}.{:03}000000{}",
        now.format("%Y-%m-%dT%H:%M:%S"),
        now.timestamp_subsec_millis(),
        now.format("%:z"),
    )
}
