use schema_logger::config::{LogFormat, LoggerConfig};
use schema_logger::logger::Logger;
use schema_logger::value::LogValue;

fn main() {
    let logger = Logger::new(LoggerConfig {
        service_name: "checkout".to_string(),
        format: LogFormat::Elasticsearch,
        include_system_info: true,
    });

    logger.info("starting service", None);

    // Self-referential payloads are marked instead of looping.
    let ctx = LogValue::object();
    ctx.insert("attempt", 1);
    ctx.insert("job", ctx.clone());
    logger.error("job failed", Some(ctx));
}
