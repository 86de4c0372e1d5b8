/// Environment variable names recognized by this crate.
///
/// These are purely helpers; the core logger types remain decoupled
/// from environment access, except for the single mode probe performed
/// when a logger is constructed.

/// Deployment mode marker. The value `development` selects the
/// colorized line format; any other value, or absence, selects JSON.
pub const APP_ENV: &str = "APP_ENV";

/// Logical service name, read by `LoggerConfig::from_env`.
pub const LOG_SERVICE_NAME_ENV: &str = "LOG_SERVICE_NAME";

/// Output schema selector, `datadog` or `elasticsearch`.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Set to `0` or `false` to drop the `inferred` snapshot from records.
pub const LOG_SYSTEM_INFO_ENV: &str = "LOG_SYSTEM_INFO";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
