//! Environment-configured, batched hook example
//!
//! Reads `AWS_CLOUDWATCH_LOG_*` variables (group and stream default to demo
//! values), batches entries on the configured interval and reports how each
//! batch left the queue.
//!
//! Run with:
//! AWS_CLOUDWATCH_LOG_BATCH_DURATION=500ms AWS_CLOUDWATCH_LOG_GROUP_TAGS="team=demo" \
//!     cargo run --example advanced

use cloudwatch_log_hook::prelude::*;
use cloudwatch_log_hook::FlushReason;
use std::env;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    let lookup = |key: &str| {
        env::var(key).ok().or_else(|| match key {
            "AWS_CLOUDWATCH_LOG_GROUP" => Some("demo-group".to_string()),
            "AWS_CLOUDWATCH_LOG_STREAM" => Some("demo-stream".to_string()),
            "AWS_CLOUDWATCH_LOG_BATCH_DURATION" => Some("1s".to_string()),
            _ => None,
        })
    };

    let config = match HookConfig::from_lookup(lookup) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    println!("=== CloudWatch Log Hook - Advanced Example ===\n");
    println!("Group:          {}", config.group);
    println!("Stream:         {}", config.stream);
    println!("Batch duration: {:?}", config.options.batch_duration());
    println!("Retention days: {:?}", config.options.retention_days());
    println!("Tags:           {:?}\n", config.options.tags());

    let client = Arc::new(MemoryLogsClient::new());
    let options = config.options.with_formatter(OutputFormat::Json);
    let hook = match CloudWatchHook::new(client.clone(), &config.group, &config.stream, options) {
        Ok(hook) => hook,
        Err(e) => {
            eprintln!("ERROR: Failed to create hook: {}", e);
            process::exit(3);
        }
    };

    let logger = Logger::builder().appender(hook).build();

    for i in 0..10 {
        println!("Sending INFO message {}", i);
        logger.info_with_context(
            "This is a test message",
            LogContext::new()
                .with_field("event", "testevent")
                .with_field("topic", "testtopic")
                .with_field("key", "testkey"),
        );
        thread::sleep(Duration::from_millis(250));
    }

    if let Err(e) = logger.flush() {
        eprintln!("ERROR: Final flush failed: {}", e);
        process::exit(2);
    }

    println!("\nRequests:");
    for call in client.put_calls() {
        println!(
            "   {} events, {} bytes, accepted: {}",
            call.event_count, call.size_bytes, call.accepted
        );
    }
    println!(
        "\nStored events: {}",
        client.events(&config.group, &config.stream).len()
    );

    // The hook lives inside the logger; a standalone one exposes its metrics
    let probe = CloudWatchHook::new(
        client.clone(),
        &config.group,
        "metrics-probe",
        HookOptions::new().with_batch_duration(Duration::from_millis(100)),
    );
    if let Ok(probe) = probe {
        for i in 0..3 {
            let _ = probe.write_message(format!("probe {}", i).as_bytes());
        }
        thread::sleep(Duration::from_millis(300));
        println!(
            "Probe flushes: timer={} full={} requested={}",
            probe.metrics().flushes(FlushReason::Timer),
            probe.metrics().flushes(FlushReason::Full),
            probe.metrics().flushes(FlushReason::Requested)
        );
    }
}
