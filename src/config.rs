use std::str::FromStr;

use crate::env::{env_or, LOG_FORMAT_ENV, LOG_SERVICE_NAME_ENV, LOG_SYSTEM_INFO_ENV};

/// Output schema used on the production (JSON) path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Flat layout: `service`/`hostname` strings, `status` severity
    /// field, fixed `ddsource` marker.
    #[default]
    Datadog,
    /// Nested layout: `service.name`/`host.name` objects, `level`
    /// severity field.
    Elasticsearch,
}

/// Error type returned when parsing a format name.
#[derive(thiserror::Error, Debug)]
pub enum FormatParseError {
    #[error("unknown log format: {0:?}")]
    Unknown(String),
}

impl FromStr for LogFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("datadog") {
            Ok(LogFormat::Datadog)
        } else if s.eq_ignore_ascii_case("elasticsearch") {
            Ok(LogFormat::Elasticsearch)
        } else {
            Err(FormatParseError::Unknown(s.to_string()))
        }
    }
}

/// Per-instance logger configuration.
///
/// **Fields**
/// - `service_name`: logical service identity stamped on every record.
/// - `format`: which of the two JSON schemas production records use.
/// - `include_system_info`: whether each record carries an `inferred`
///   host/runtime snapshot.
///
/// Configuration is fixed for the lifetime of a
/// [`Logger`](crate::logger::Logger); nothing is mutated after
/// construction.
#[derive(Clone, Debug)]
pub struct LoggerConfig {
    pub service_name: String,
    pub format: LogFormat,
    pub include_system_info: bool,
}

impl LoggerConfig {
    /// Configuration with the given service name and all defaults:
    /// Datadog format, snapshot enabled.
    pub fn new(service_name: impl Into<String>) -> Self {
        LoggerConfig {
            service_name: service_name.into(),
            format: LogFormat::default(),
            include_system_info: true,
        }
    }

    /// Build a configuration from the `LOG_*` environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults:
    /// service name `"unknown"`, Datadog format, snapshot enabled.
    pub fn from_env() -> Self {
        let format = env_or(LOG_FORMAT_ENV, "").parse().unwrap_or_default();
        let system_info = env_or(LOG_SYSTEM_INFO_ENV, "true");

        LoggerConfig {
            service_name: env_or(LOG_SERVICE_NAME_ENV, "unknown"),
            format,
            include_system_info: !matches!(system_info.as_str(), "0" | "false"),
        }
    }
}

impl From<&str> for LoggerConfig {
    fn from(service_name: &str) -> Self {
        LoggerConfig::new(service_name)
    }
}

impl From<String> for LoggerConfig {
    fn from(service_name: String) -> Self {
        LoggerConfig::new(service_name)
    }
}
