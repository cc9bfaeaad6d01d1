//! Amazon CloudWatch Logs appender
//!
//! [`CloudWatchHook`] formats log entries and uploads them to one log
//! stream through a [`LogsClient`], either one request per entry or in
//! batches assembled by a background worker.

pub mod batch;
pub mod client;
pub mod config;
pub mod event;
pub mod hook;
pub mod memory;
pub mod uploader;
mod worker;

#[cfg(feature = "aws")]
pub mod aws;

pub use batch::{Batch, BatchAssembler, BatchLimits, MAX_BATCH_BYTES, MAX_BATCH_EVENTS};
pub use client::{
    CreateLogGroupRequest, LogGroupSummary, LogStreamSummary, LogsClient, Page,
    PutLogEventsRequest, PutLogEventsResponse,
};
pub use config::{parse_duration, parse_tags, HookConfig};
pub use event::{LogEvent, EVENT_OVERHEAD_BYTES, MAX_EVENT_BYTES};
pub use hook::{CloudWatchHook, HookOptions, DEFAULT_FLUSH_TIMEOUT, DEFAULT_LEVELS};
pub use memory::{LogGroupRecord, MemoryLogsClient, PutCall};
pub use uploader::{GroupSettings, Uploader};
pub use worker::QUEUE_CAPACITY;

#[cfg(feature = "aws")]
pub use aws::AwsLogsClient;
