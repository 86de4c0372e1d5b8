use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::Local;

use crate::config::LoggerConfig;
use crate::env::{env_or, APP_ENV};
use crate::inferred::{HostSystemInfo, SystemInfoSource};
use crate::record::{self, Severity};
use crate::render;
use crate::value::LogValue;

/// Output mode, decided once when the logger is constructed and never
/// re-evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Development,
    Production,
}

fn mode_from_env() -> Mode {
    if env_or(APP_ENV, "") == "development" {
        Mode::Development
    } else {
        Mode::Production
    }
}

/// Structured logger with per-instance configuration.
///
/// Each severity method performs exactly one synchronous write of one
/// line: a colorized human-readable line in development, one JSON
/// record in production. A call never panics and never returns an
/// error, whatever the context looks like: cycles are replaced by a
/// marker and failing captures degrade the record instead of losing
/// the line.
pub struct Logger {
    config: LoggerConfig,
    mode: Mode,
    source: Arc<dyn SystemInfoSource>,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
    /// Construct from a bare service name or a full [`LoggerConfig`].
    ///
    /// The output mode is probed from the `APP_ENV` variable here,
    /// once; output goes to stdout.
    pub fn new(config: impl Into<LoggerConfig>) -> Self {
        Logger::with_parts(
            config.into(),
            mode_from_env(),
            Box::new(io::stdout()),
            Arc::new(HostSystemInfo),
        )
    }

    /// Like [`Logger::new`], but writing to the provided target
    /// instead of stdout.
    pub fn with_writer(config: impl Into<LoggerConfig>, writer: Box<dyn Write + Send>) -> Self {
        Logger::with_parts(config.into(), mode_from_env(), writer, Arc::new(HostSystemInfo))
    }

    /// Replace the snapshot source, keeping everything else.
    pub fn with_system_info_source(mut self, source: Arc<dyn SystemInfoSource>) -> Self {
        self.source = source;
        self
    }

    pub(crate) fn with_parts(
        config: LoggerConfig,
        mode: Mode,
        writer: Box<dyn Write + Send>,
        source: Arc<dyn SystemInfoSource>,
    ) -> Self {
        Logger {
            config,
            mode,
            source,
            writer: Mutex::new(writer),
        }
    }

    pub fn debug(&self, message: &str, context: Option<LogValue>) {
        self.log(Severity::Debug, message, context);
    }

    pub fn info(&self, message: &str, context: Option<LogValue>) {
        self.log(Severity::Info, message, context);
    }

    pub fn warn(&self, message: &str, context: Option<LogValue>) {
        self.log(Severity::Warn, message, context);
    }

    pub fn error(&self, message: &str, context: Option<LogValue>) {
        self.log(Severity::Error, message, context);
    }

    pub fn fatal(&self, message: &str, context: Option<LogValue>) {
        self.log(Severity::Fatal, message, context);
    }

    fn log(&self, severity: Severity, message: &str, context: Option<LogValue>) {
        let now = Local::now();
        let line = match self.mode {
            Mode::Development => render::dev_line(severity, message, context.as_ref(), now),
            Mode::Production => {
                let record = record::build(
                    severity,
                    message,
                    context.as_ref(),
                    &self.config,
                    now,
                    self.source.as_ref(),
                );
                render::json_line(&record)
            }
        };

        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(writer, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::config::LogFormat;

    /// Writer that captures output for verification.
    #[derive(Clone)]
    struct TestWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl TestWriter {
        fn new() -> Self {
            TestWriter {
                buffer: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn lines(&self) -> Vec<String> {
            let buffer = self.buffer.lock().unwrap();
            String::from_utf8_lossy(&buffer)
                .lines()
                .map(|line| line.to_string())
                .collect()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct StubSource;

    impl SystemInfoSource for StubSource {
        fn hostname(&self) -> String {
            "test-host".to_string()
        }

        fn snapshot(&self) -> Value {
            json!({
                "system": {},
                "process": {},
                "env": {},
                "hardware": {},
                "network": {},
            })
        }
    }

    fn production_logger(writer: TestWriter) -> Logger {
        Logger::with_parts(
            LoggerConfig {
                service_name: "checkout".to_string(),
                format: LogFormat::Datadog,
                include_system_info: false,
            },
            Mode::Production,
            Box::new(writer),
            Arc::new(StubSource),
        )
    }

    #[test]
    fn two_calls_produce_two_independent_lines() {
        let writer = TestWriter::new();
        let logger = production_logger(writer.clone());

        logger.info("first", Some(LogValue::from(json!({"n": 1}))));
        logger.error("second", None);

        let lines = writer.lines();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(&lines[0]).unwrap();
        let second: Value = serde_json::from_str(&lines[1]).unwrap();

        assert_eq!(first["message"], json!("first"));
        assert_eq!(first["n"], json!(1));
        assert_eq!(second["message"], json!("second"));
        assert!(second.get("n").is_none());
    }

    #[test]
    fn cyclic_context_still_emits_a_line() {
        let writer = TestWriter::new();
        let logger = production_logger(writer.clone());

        let context = LogValue::object();
        context.insert("self", context.clone());
        logger.warn("looped", Some(context));

        let lines = writer.lines();
        assert_eq!(lines.len(), 1);

        let record: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(record["self"], json!("[Circular]"));
        assert_eq!(record["status"], json!("WARN"));
    }

    #[test]
    fn failing_capture_still_emits_a_line() {
        struct Refusing;
        impl serde::Serialize for Refusing {
            fn serialize<S: serde::Serializer>(
                &self,
                _serializer: S,
            ) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("refused"))
            }
        }

        let writer = TestWriter::new();
        let logger = production_logger(writer.clone());

        logger.fatal("cannot encode", Some(LogValue::capture(Refusing)));

        let lines = writer.lines();
        assert_eq!(lines.len(), 1);

        let record: Value = serde_json::from_str(&lines[0]).unwrap();
        let message = record["message"].as_str().unwrap();
        assert!(message.contains("cannot encode"));
        assert_eq!(record["status"], json!("FATAL"));
    }

    #[test]
    fn development_mode_writes_readable_lines() {
        let writer = TestWriter::new();
        let logger = Logger::with_parts(
            LoggerConfig::new("checkout"),
            Mode::Development,
            Box::new(writer.clone()),
            Arc::new(StubSource),
        );

        logger.info("service ready", None);

        let lines = writer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].ends_with("service ready"));
        assert!(serde_json::from_str::<Value>(&lines[0]).is_err());
    }

    #[test]
    fn all_severities_emit() {
        let writer = TestWriter::new();
        let logger = production_logger(writer.clone());

        logger.debug("d", None);
        logger.info("i", None);
        logger.warn("w", None);
        logger.error("e", None);
        logger.fatal("f", None);

        let lines = writer.lines();
        assert_eq!(lines.len(), 5);

        let statuses: Vec<String> = lines
            .iter()
            .map(|line| {
                let record: Value = serde_json::from_str(line).unwrap();
                record["status"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(statuses, ["DEBUG", "INFO", "WARN", "ERROR", "FATAL"]);
    }
}
