use schema_logger::logger::Logger;
use schema_logger::value::LogValue;

fn main() {
    std::env::set_var(schema_logger::env::APP_ENV, "development");

    let logger = Logger::new("checkout");

    logger.info("starting service", None);

    let ctx = LogValue::object();
    ctx.insert("user_id", 42);
    ctx.insert("plan", "pro");
    logger.warn("quota nearly exhausted", Some(ctx));

    logger.error(
        "payment rejected",
        Some(LogValue::from(serde_json::json!({
            "order": {"id": "ord_123", "total_cents": 1999},
            "retries": [1, 2, 3],
        }))),
    );

    logger.debug("retrying in 5s", None);
    logger.fatal("giving up", None);
}
