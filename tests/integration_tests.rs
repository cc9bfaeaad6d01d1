//! Integration tests for the CloudWatch hook
//!
//! These tests verify:
//! - Immediate uploads without a batch duration
//! - Timer, count and byte triggered batch uploads
//! - Batch errors reported once by the next write
//! - Sequence token threading across requests
//! - Log group and stream provisioning
//! - End-to-end delivery through the logger

use cloudwatch_log_hook::appenders::cloudwatch::{MAX_BATCH_BYTES, MAX_BATCH_EVENTS};
use cloudwatch_log_hook::prelude::*;
use cloudwatch_log_hook::FlushReason;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const GROUP: &str = "integration";
const STREAM: &str = "stream-1";
const LONG_INTERVAL: Duration = Duration::from_secs(3600);

/// Poll until `condition` holds or `timeout` elapses
fn wait_for(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

fn batched_hook(client: &Arc<MemoryLogsClient>, limits: BatchLimits) -> CloudWatchHook {
    let options = HookOptions::new()
        .with_batch_duration(LONG_INTERVAL)
        .with_batch_limits(limits);
    CloudWatchHook::new(client.clone(), GROUP, STREAM, options).expect("Failed to create hook")
}

fn messages(client: &MemoryLogsClient) -> Vec<String> {
    client
        .events(GROUP, STREAM)
        .into_iter()
        .map(|e| e.message)
        .collect()
}

#[test]
fn test_unbatched_uploads_each_write() {
    let client = Arc::new(MemoryLogsClient::new());
    let hook = CloudWatchHook::new(client.clone(), GROUP, STREAM, HookOptions::new())
        .expect("Failed to create hook");

    for i in 0..3 {
        hook.write_message(format!("message {}", i).as_bytes())
            .expect("write should upload");
        assert_eq!(client.put_calls().len(), i + 1);
    }

    assert!(client.put_calls().iter().all(|p| p.event_count == 1));
    assert_eq!(messages(&client), vec!["message 0", "message 1", "message 2"]);
}

#[test]
fn test_timer_flush() {
    let client = Arc::new(MemoryLogsClient::new());
    let options = HookOptions::new().with_batch_duration(Duration::from_millis(50));
    let hook = CloudWatchHook::new(client.clone(), GROUP, STREAM, options)
        .expect("Failed to create hook");

    hook.write_message(b"tick").unwrap();
    hook.write_message(b"tock").unwrap();

    assert!(
        wait_for(Duration::from_secs(5), || client.events(GROUP, STREAM).len() == 2),
        "timer should have uploaded the batch"
    );
    assert!(hook.metrics().flushes(FlushReason::Timer) >= 1);

    // Idle ticks do not produce empty requests
    thread::sleep(Duration::from_millis(200));
    assert!(client.put_calls().iter().all(|p| p.event_count > 0));
}

#[test]
fn test_count_limit_flushes_early() {
    let client = Arc::new(MemoryLogsClient::new());
    let limits = BatchLimits::new(10, MAX_BATCH_BYTES).unwrap();
    let hook = batched_hook(&client, limits);

    for i in 0..25 {
        hook.write_message(format!("event {}", i).as_bytes()).unwrap();
    }

    assert!(wait_for(Duration::from_secs(5), || client.put_calls().len() == 2));
    hook.flush().expect("flush should succeed");

    let counts: Vec<_> = client.put_calls().iter().map(|p| p.event_count).collect();
    assert_eq!(counts, vec![10, 10, 5]);
    assert_eq!(hook.metrics().flushes(FlushReason::Full), 2);
    assert_eq!(hook.metrics().flushes(FlushReason::Requested), 1);
    assert_eq!(messages(&client).len(), 25);
}

#[test]
fn test_byte_limit_flushes_early() {
    let client = Arc::new(MemoryLogsClient::new());
    let limits = BatchLimits::new(MAX_BATCH_EVENTS, 1000).unwrap();
    let hook = batched_hook(&client, limits);

    // 400 bytes + 26 overhead: two fit in 1000, a third does not
    let payload = vec![b'a'; 400];
    for _ in 0..5 {
        hook.write_message(&payload).unwrap();
    }
    hook.flush().unwrap();

    let puts = client.put_calls();
    let counts: Vec<_> = puts.iter().map(|p| p.event_count).collect();
    assert_eq!(counts, vec![2, 2, 1]);
    assert!(puts.iter().all(|p| p.size_bytes <= 1000));
}

#[test]
fn test_batch_error_reported_once_by_next_write() {
    let client = Arc::new(MemoryLogsClient::new());
    let limits = BatchLimits::new(1, MAX_BATCH_BYTES).unwrap();
    let hook = batched_hook(&client, limits);

    client.fail_next_put(LoggerError::service("PutLogEvents", "throttled"));
    hook.write_message(b"lost").unwrap();
    // Pushes "lost" out as a full batch, which fails. The worker may finish
    // before or after this call checks for errors.
    let second = hook.write_message(b"second");

    assert!(wait_for(Duration::from_secs(5), || hook.metrics().requests_failed() == 1));
    thread::sleep(Duration::from_millis(50));
    let third = hook.write_message(b"third");

    let reported: Vec<_> = [second, third].into_iter().filter_map(|r| r.err()).collect();
    assert_eq!(reported.len(), 1, "error must be reported exactly once");
    match &reported[0] {
        LoggerError::BatchUploadFailed(source) => {
            assert!(matches!(**source, LoggerError::Service { .. }));
        }
        other => panic!("unexpected error: {}", other),
    }

    // Writes that report an error are still queued
    hook.write_message(b"fourth").unwrap();
    hook.flush().unwrap();

    assert_eq!(messages(&client), vec!["second", "third", "fourth"]);
    assert_eq!(hook.metrics().events_failed(), 1);
}

#[test]
fn test_batch_error_reported_by_flush() {
    let client = Arc::new(MemoryLogsClient::new());
    let hook = batched_hook(&client, BatchLimits::default());

    client.fail_next_put(LoggerError::service("PutLogEvents", "unavailable"));
    hook.write_message(b"lost").unwrap();

    assert!(matches!(
        hook.flush(),
        Err(LoggerError::BatchUploadFailed(_))
    ));
    assert!(hook.flush().is_ok());
}

#[test]
fn test_sequence_token_threaded_across_batches() {
    let client = Arc::new(MemoryLogsClient::new());
    let limits = BatchLimits::new(2, MAX_BATCH_BYTES).unwrap();
    let hook = batched_hook(&client, limits);

    for i in 0..6 {
        hook.write_message(format!("{}", i).as_bytes()).unwrap();
    }
    hook.flush().unwrap();

    let puts = client.put_calls();
    assert_eq!(puts.len(), 3);
    assert!(puts.iter().all(|p| p.accepted));
    assert_eq!(puts[0].sequence_token, None);
    assert!(puts[1].sequence_token.is_some());
    assert_ne!(puts[1].sequence_token, puts[2].sequence_token);
    assert_eq!(hook.sequence_token(), client.stream_token(GROUP, STREAM));
}

#[test]
fn test_group_created_with_settings() {
    let client = Arc::new(MemoryLogsClient::new());
    let tags = HashMap::from([
        ("team".to_string(), "platform".to_string()),
        ("env".to_string(), "test".to_string()),
    ]);
    let options = HookOptions::new()
        .with_group_retention_days(7)
        .with_group_kms_key_id("arn:aws:kms:us-east-1:123456789012:key/abc")
        .with_group_tags(tags.clone());

    let _hook = CloudWatchHook::new(client.clone(), GROUP, STREAM, options).unwrap();

    let group = client.log_group(GROUP).expect("group should exist");
    assert_eq!(group.retention_days, Some(7));
    assert_eq!(
        group.kms_key_id.as_deref(),
        Some("arn:aws:kms:us-east-1:123456789012:key/abc")
    );
    assert_eq!(group.tags, tags);
    assert!(client.has_log_stream(GROUP, STREAM));
}

#[test]
fn test_existing_stream_is_reused() {
    let client = Arc::new(MemoryLogsClient::new());
    {
        let first = CloudWatchHook::new(client.clone(), GROUP, STREAM, HookOptions::new()).unwrap();
        first.write_message(b"from first hook").unwrap();
    }

    // A new hook must pick up the token the first one left behind
    let second = CloudWatchHook::new(client.clone(), GROUP, STREAM, HookOptions::new()).unwrap();
    assert_eq!(second.sequence_token(), client.stream_token(GROUP, STREAM));
    second.write_message(b"from second hook").unwrap();

    assert_eq!(client.create_group_calls(), 1);
    assert_eq!(client.create_stream_calls(), 1);
    assert_eq!(messages(&client), vec!["from first hook", "from second hook"]);
}

#[test]
fn test_lookup_walks_every_page() {
    let client = Arc::new(MemoryLogsClient::new().with_page_size(1));
    for name in ["integration-a", "integration-b", GROUP] {
        client.insert_log_group(name);
    }
    for stream in ["stream-0", "stream-10", STREAM] {
        client.insert_log_stream(GROUP, stream);
    }

    let _hook = CloudWatchHook::new(client.clone(), GROUP, STREAM, HookOptions::new()).unwrap();

    assert_eq!(client.create_group_calls(), 0);
    assert_eq!(client.create_stream_calls(), 0);
}

#[test]
fn test_drop_uploads_pending_batch() {
    let client = Arc::new(MemoryLogsClient::new());
    let hook = batched_hook(&client, BatchLimits::default());

    hook.write_message(b"pending 1").unwrap();
    hook.write_message(b"pending 2").unwrap();
    assert!(client.put_calls().is_empty());

    drop(hook);
    assert_eq!(messages(&client), vec!["pending 1", "pending 2"]);
}

#[test]
fn test_logger_end_to_end() {
    let client = Arc::new(MemoryLogsClient::new());
    let options = HookOptions::new()
        .with_batch_duration(LONG_INTERVAL)
        .with_formatter(OutputFormat::Json);
    let hook = CloudWatchHook::new(client.clone(), GROUP, STREAM, options).unwrap();

    let logger = Logger::builder()
        .min_level(LogLevel::Trace)
        .appender(hook)
        .build();

    logger.trace("not shipped by default");
    logger.info_with_context(
        "Request processed",
        LogContext::new()
            .with_field("status", 200)
            .with_field("path", "/health"),
    );
    logger.fatal("fatal entries are shipped too");
    logger.flush().expect("flush should succeed");

    let events = client.events(GROUP, STREAM);
    assert_eq!(events.len(), 2);

    let first: serde_json::Value = serde_json::from_str(&events[0].message).unwrap();
    assert_eq!(first["level"], "info");
    assert_eq!(first["msg"], "Request processed");
    assert_eq!(first["status"], 200);
    assert_eq!(first["path"], "/health");

    let second: serde_json::Value = serde_json::from_str(&events[1].message).unwrap();
    assert_eq!(second["level"], "fatal");
    assert_eq!(logger.failed_count(), 0);
}

#[test]
fn test_logger_counts_hook_failures() {
    let client = Arc::new(MemoryLogsClient::new());
    let hook = CloudWatchHook::new(client.clone(), GROUP, STREAM, HookOptions::new()).unwrap();
    let logger = Logger::builder().appender(hook).build();

    client.fail_next_put(LoggerError::service("PutLogEvents", "throttled"));
    logger.info("lost");
    logger.info("kept");

    assert_eq!(logger.failed_count(), 1);
    assert_eq!(logger.logged_count(), 1);
    assert_eq!(client.events(GROUP, STREAM).len(), 1);
}

#[test]
fn test_config_builds_hook() {
    let vars = HashMap::from([
        ("AWS_CLOUDWATCH_LOG_GROUP", "from-env"),
        ("AWS_CLOUDWATCH_LOG_STREAM", "worker"),
        ("AWS_CLOUDWATCH_LOG_RETENTION_DAYS", "30"),
        ("AWS_CLOUDWATCH_LOG_GROUP_TAGS", "service=billing"),
    ]);
    let config = HookConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

    let client = Arc::new(MemoryLogsClient::new());
    let hook = CloudWatchHook::new(client.clone(), config.group, config.stream, config.options)
        .unwrap();
    assert!(!hook.is_batched());

    let group = client.log_group("from-env").unwrap();
    assert_eq!(group.retention_days, Some(30));
    assert_eq!(group.tags.get("service").map(String::as_str), Some("billing"));
    assert!(client.has_log_stream("from-env", "worker"));
}
