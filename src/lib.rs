//! # CloudWatch Log Hook
//!
//! A logger appender that ships log entries to Amazon CloudWatch Logs.
//!
//! ## Features
//!
//! - **Hook into a logger**: [`CloudWatchHook`] is an [`Appender`] with its own level set
//! - **Immediate or batched**: one upload per entry, or batches flushed on an interval
//! - **Service limits respected**: batches stay within 10,000 events and 1 MiB
//! - **Auto provisioning**: the log group and stream are created when missing
//! - **Environment config**: [`HookConfig::from_env`] reads `AWS_CLOUDWATCH_LOG_*`
//!
//! Transport goes through the [`LogsClient`] trait. [`MemoryLogsClient`]
//! keeps everything in process; the `aws` feature adds `AwsLogsClient`
//! on top of the official SDK.
//!
//! ```
//! use cloudwatch_log_hook::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let client = Arc::new(MemoryLogsClient::new());
//! let options = HookOptions::new().with_batch_duration(Duration::from_secs(5));
//! let hook = CloudWatchHook::new(client.clone(), "app", "web-1", options).unwrap();
//!
//! let logger = Logger::builder().appender(hook).build();
//! logger.info("queued for the next batch");
//! logger.flush().unwrap();
//!
//! assert_eq!(client.events("app", "web-1").len(), 1);
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::cloudwatch::{
        BatchLimits, CloudWatchHook, HookConfig, HookOptions, LogEvent, LogsClient,
        MemoryLogsClient,
    };
    #[cfg(feature = "aws")]
    pub use crate::appenders::cloudwatch::AwsLogsClient;
    pub use crate::core::{
        Appender, FieldValue, LogContext, LogEntry, LogLevel, Logger, LoggerBuilder, LoggerError,
        OutputFormat, Result, UploadMetrics,
    };
}

#[cfg(feature = "aws")]
pub use appenders::cloudwatch::AwsLogsClient;
pub use appenders::cloudwatch::{
    BatchLimits, CloudWatchHook, HookConfig, HookOptions, LogEvent, LogsClient, MemoryLogsClient,
};
pub use core::{
    Appender, FieldValue, FlushReason, LogContext, LogEntry, LogLevel, Logger, LoggerBuilder,
    LoggerError, OutputFormat, Result, UploadMetrics,
};
