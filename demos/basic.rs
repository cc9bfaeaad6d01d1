//! Basic hook usage example
//!
//! Ships a few entries through an unbatched hook backed by the in-memory
//! client, then prints what the service received.
//!
//! Run with: cargo run --example basic

use cloudwatch_log_hook::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== CloudWatch Log Hook - Basic Usage Example ===\n");

    let client = Arc::new(MemoryLogsClient::new());
    let hook = CloudWatchHook::new(client.clone(), "demo-group", "demo-stream", HookOptions::new())?;

    let logger = Logger::builder()
        .min_level(LogLevel::Trace)
        .appender(hook)
        .build();

    println!("1. Logging at different levels (trace is not shipped by default):");
    logger.trace("This is a trace message");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.warn("This is a warning message");
    logger.error("This is an error message");

    println!("\n2. Logging with fields:");
    logger.info_with_context(
        "This is a test message",
        LogContext::new()
            .with_field("event", "testevent")
            .with_field("topic", "testtopic")
            .with_field("key", "testkey"),
    );

    println!("\n3. Events received by the service:");
    for event in client.events("demo-group", "demo-stream") {
        println!("   [{}] {}", event.timestamp, event.message);
    }
    println!("   {} requests sent", client.put_calls().len());

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
