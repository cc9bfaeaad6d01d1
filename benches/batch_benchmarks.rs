//! Criterion benchmarks for cloudwatch_log_hook

use cloudwatch_log_hook::appenders::cloudwatch::BatchAssembler;
use cloudwatch_log_hook::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;

const WRITES_PER_ITER: u64 = 1_000;

fn memory_hook(options: HookOptions) -> (CloudWatchHook, Arc<MemoryLogsClient>) {
    let client = Arc::new(MemoryLogsClient::new());
    let hook = CloudWatchHook::new(client.clone(), "bench", "stream", options).unwrap();
    (hook, client)
}

// ============================================================================
// Batch Assembly Benchmarks
// ============================================================================

fn bench_batch_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_assembly");
    group.throughput(Throughput::Elements(1));

    let mut assembler = BatchAssembler::new(BatchLimits::default());
    group.bench_function("push_small", |b| {
        b.iter(|| {
            black_box(assembler.push(LogEvent::new(0, black_box("short message"))));
        });
    });

    let mut assembler = BatchAssembler::new(BatchLimits::default());
    let large = "x".repeat(8 * 1024);
    group.bench_function("push_8k", |b| {
        b.iter(|| {
            black_box(assembler.push(LogEvent::new(0, large.clone())));
        });
    });

    group.finish();
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.throughput(Throughput::Elements(1));

    let entry = LogEntry::new(LogLevel::Info, "Request processed")
        .with_field("user_id", 12345)
        .with_field("path", "/api/orders")
        .with_field("latency_ms", 12.5);

    group.bench_function("text", |b| {
        b.iter(|| black_box(OutputFormat::Text.format(black_box(&entry))));
    });

    group.bench_function("json", |b| {
        b.iter(|| black_box(OutputFormat::Json.format(black_box(&entry))));
    });

    group.finish();
}

// ============================================================================
// Write Path Benchmarks
// ============================================================================

fn bench_write_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_path");
    group.throughput(Throughput::Elements(WRITES_PER_ITER));
    group.sample_size(20);

    group.bench_function("unbatched", |b| {
        b.iter_batched(
            || memory_hook(HookOptions::new()),
            |(hook, _client)| {
                for _ in 0..WRITES_PER_ITER {
                    hook.write_message(black_box(b"unbatched message")).unwrap();
                }
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("batched", |b| {
        b.iter_batched(
            || memory_hook(HookOptions::new().with_batch_duration(Duration::from_secs(3600))),
            |(hook, _client)| {
                for _ in 0..WRITES_PER_ITER {
                    hook.write_message(black_box(b"batched message")).unwrap();
                }
                hook.flush().unwrap();
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("logger_batched", |b| {
        b.iter_batched(
            || {
                let (hook, client) =
                    memory_hook(HookOptions::new().with_batch_duration(Duration::from_secs(3600)));
                (Logger::builder().appender(hook).build(), client)
            },
            |(logger, _client)| {
                for _ in 0..WRITES_PER_ITER {
                    logger.info(black_box("logger message"));
                }
                logger.flush().unwrap();
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

// ============================================================================
// Level Filtering Benchmarks
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let (hook, _client) = memory_hook(HookOptions::new().with_levels(vec![LogLevel::Error]));
    let logger = Logger::builder()
        .min_level(LogLevel::Warn)
        .appender(hook)
        .build();

    group.bench_function("below_min_level", |b| {
        b.iter(|| logger.debug(black_box("filtered by the logger")));
    });

    group.bench_function("outside_hook_levels", |b| {
        b.iter(|| logger.warn(black_box("filtered by the hook")));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_batch_assembly,
    bench_formatting,
    bench_write_path,
    bench_level_filtering
);

criterion_main!(benches);
