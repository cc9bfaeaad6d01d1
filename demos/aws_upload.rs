//! Upload to a real CloudWatch Logs stream
//!
//! Uses the default AWS credential chain. Requires the `aws` feature.
//!
//! Run with:
//! AWS_CLOUDWATCH_LOG_GROUP=my-group AWS_CLOUDWATCH_LOG_STREAM=my-stream \
//!     cargo run --example aws_upload --features aws

use cloudwatch_log_hook::prelude::*;
use std::process;
use std::sync::Arc;

fn main() {
    let config = match HookConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let client = match AwsLogsClient::new(config.region.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("ERROR: Failed to load AWS configuration: {}", e);
            process::exit(2);
        }
    };

    let options = config.options.with_formatter(OutputFormat::Json);
    let hook = match CloudWatchHook::new(client, config.group, config.stream, options) {
        Ok(hook) => hook,
        Err(e) => {
            eprintln!("ERROR: Failed to create hook: {}", e);
            process::exit(3);
        }
    };

    let logger = Logger::builder().appender(hook).build();
    logger.info_with_context(
        "This is a test message",
        LogContext::new()
            .with_field("event", "testevent")
            .with_field("topic", "testtopic")
            .with_field("key", "testkey"),
    );

    if let Err(e) = logger.flush() {
        eprintln!("ERROR: Upload failed: {}", e);
        process::exit(4);
    }
    println!("Sent one entry to CloudWatch Logs");
}
