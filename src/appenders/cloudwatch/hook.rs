//! The CloudWatch Logs appender
//!
//! Without a batch duration every entry is uploaded before `append`
//! returns and upload errors come straight back. With a batch duration the
//! entry is queued for the background worker; an upload failure is reported
//! by the next write (or `flush`) and then forgotten.

use super::batch::BatchLimits;
use super::client::LogsClient;
use super::config::validate_retention_days;
use super::event::LogEvent;
use super::uploader::{GroupSettings, Uploader};
use super::worker::{BatchWorker, ErrorSlot};
use crate::core::{
    Appender, LogEntry, LogLevel, LoggerError, OutputFormat, Result, UploadMetrics,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// How long `flush` and drop wait for the batch worker
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Levels shipped unless overridden with [`HookOptions::with_levels`]
pub const DEFAULT_LEVELS: [LogLevel; 5] = [
    LogLevel::Debug,
    LogLevel::Info,
    LogLevel::Warn,
    LogLevel::Error,
    LogLevel::Fatal,
];

/// Optional settings for [`CloudWatchHook`]
///
/// # Example
///
/// ```
/// use cloudwatch_log_hook::prelude::*;
/// use std::collections::HashMap;
/// use std::time::Duration;
///
/// let options = HookOptions::new()
///     .with_group_retention_days(30)
///     .with_group_tags(HashMap::from([("team".to_string(), "payments".to_string())]))
///     .with_batch_duration(Duration::from_secs(5))
///     .with_formatter(OutputFormat::Json);
///
/// assert_eq!(options.batch_duration(), Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone)]
pub struct HookOptions {
    group: GroupSettings,
    batch_duration: Option<Duration>,
    formatter: OutputFormat,
    levels: Vec<LogLevel>,
    limits: BatchLimits,
    flush_timeout: Duration,
}

impl HookOptions {
    pub fn new() -> Self {
        Self {
            group: GroupSettings::default(),
            batch_duration: None,
            formatter: OutputFormat::default(),
            levels: DEFAULT_LEVELS.to_vec(),
            limits: BatchLimits::default(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }

    /// Retention applied when the hook creates the log group
    #[must_use = "builder methods return a new value"]
    pub fn with_group_retention_days(mut self, days: u32) -> Self {
        self.group.retention_days = Some(days);
        self
    }

    /// KMS key used when the hook creates the log group
    #[must_use = "builder methods return a new value"]
    pub fn with_group_kms_key_id(mut self, id: impl Into<String>) -> Self {
        self.group.kms_key_id = Some(id.into());
        self
    }

    /// Tags set when the hook creates the log group
    #[must_use = "builder methods return a new value"]
    pub fn with_group_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.group.tags = tags;
        self
    }

    /// Upload queued entries on this interval instead of one by one
    ///
    /// A zero duration keeps immediate uploads.
    #[must_use = "builder methods return a new value"]
    pub fn with_batch_duration(mut self, frequency: Duration) -> Self {
        self.batch_duration = (!frequency.is_zero()).then_some(frequency);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_formatter(mut self, formatter: OutputFormat) -> Self {
        self.formatter = formatter;
        self
    }

    /// Levels the hook accepts from the logger
    #[must_use = "builder methods return a new value"]
    pub fn with_levels(mut self, levels: impl Into<Vec<LogLevel>>) -> Self {
        self.levels = levels.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_batch_limits(mut self, limits: BatchLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    pub fn retention_days(&self) -> Option<u32> {
        self.group.retention_days
    }

    pub fn kms_key_id(&self) -> Option<&str> {
        self.group.kms_key_id.as_deref()
    }

    pub fn tags(&self) -> &HashMap<String, String> {
        &self.group.tags
    }

    pub fn batch_duration(&self) -> Option<Duration> {
        self.batch_duration
    }

    pub fn formatter(&self) -> OutputFormat {
        self.formatter
    }

    pub fn levels(&self) -> &[LogLevel] {
        &self.levels
    }

    pub fn batch_limits(&self) -> BatchLimits {
        self.limits
    }

    fn validate(&self) -> Result<()> {
        if let Some(days) = self.group.retention_days {
            validate_retention_days(days)?;
        }
        if self.flush_timeout.is_zero() {
            return Err(LoggerError::config(
                "CloudWatchHook",
                "flush timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for HookOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Appender that ships log entries to one CloudWatch Logs stream
///
/// # Example
///
/// ```
/// use cloudwatch_log_hook::prelude::*;
/// use std::sync::Arc;
///
/// let client = Arc::new(MemoryLogsClient::new());
/// let hook = CloudWatchHook::new(client.clone(), "app", "web-1", HookOptions::new()).unwrap();
///
/// let logger = Logger::builder().appender(hook).build();
/// logger.info("Server started");
///
/// assert_eq!(client.events("app", "web-1").len(), 1);
/// ```
pub struct CloudWatchHook {
    uploader: Arc<Uploader>,
    worker: Option<BatchWorker>,
    last_error: ErrorSlot,
    metrics: Arc<UploadMetrics>,
    formatter: OutputFormat,
    levels: Vec<LogLevel>,
    limits: BatchLimits,
    flush_timeout: Duration,
}

impl CloudWatchHook {
    /// Create the hook, making sure the group and stream exist
    ///
    /// # Errors
    ///
    /// Returns an error for empty names, invalid options, or when the
    /// group or stream cannot be described or created.
    pub fn new(
        client: Arc<dyn LogsClient>,
        group: impl Into<String>,
        stream: impl Into<String>,
        options: HookOptions,
    ) -> Result<Self> {
        let group = group.into();
        let stream = stream.into();
        if group.trim().is_empty() {
            return Err(LoggerError::config("CloudWatchHook", "log group name is empty"));
        }
        if stream.trim().is_empty() {
            return Err(LoggerError::config("CloudWatchHook", "log stream name is empty"));
        }
        options.validate()?;

        let metrics = Arc::new(UploadMetrics::new());
        let uploader = Arc::new(Uploader::new(client, group, stream, Arc::clone(&metrics)));
        uploader.ensure_log_group(&options.group)?;
        uploader.ensure_log_stream()?;

        let last_error: ErrorSlot = Arc::new(Mutex::new(None));
        let worker = match options.batch_duration {
            Some(interval) => Some(BatchWorker::spawn(
                interval,
                options.limits,
                Arc::clone(&uploader),
                Arc::clone(&last_error),
                Arc::clone(&metrics),
            )?),
            None => None,
        };

        Ok(Self {
            uploader,
            worker,
            last_error,
            metrics,
            formatter: options.formatter,
            levels: options.levels,
            limits: options.limits,
            flush_timeout: options.flush_timeout,
        })
    }

    /// Write a raw message, stamped with the current time
    ///
    /// Returns the number of bytes accepted. Invalid UTF-8 is replaced.
    pub fn write_message(&self, message: &[u8]) -> Result<usize> {
        let event = LogEvent::now(String::from_utf8_lossy(message));
        self.submit(event, message.len())
    }

    /// Format an entry and write it with the entry's own timestamp
    pub fn fire(&self, entry: &LogEntry) -> Result<usize> {
        let line = self.formatter.format(entry)?;
        let len = line.len();
        self.submit(LogEvent::new(entry.timestamp_millis(), line), len)
    }

    fn submit(&self, event: LogEvent, len: usize) -> Result<usize> {
        self.limits.check_event(&event)?;

        match self.worker {
            Some(ref worker) => {
                worker.send(event)?;
                self.metrics.record_accepted();
                self.take_batch_error()?;
                Ok(len)
            }
            None => {
                self.uploader.put_log_events(vec![event])?;
                self.metrics.record_accepted();
                Ok(len)
            }
        }
    }

    /// Report, and clear, the error left by a failed batch upload
    fn take_batch_error(&self) -> Result<()> {
        match self.last_error.lock().take() {
            Some(err) => Err(LoggerError::BatchUploadFailed(Box::new(err))),
            None => Ok(()),
        }
    }

    /// Upload everything queued so far
    ///
    /// A no-op for unbatched hooks. Reports a pending batch error like a
    /// write would.
    pub fn flush(&self) -> Result<()> {
        if let Some(ref worker) = self.worker {
            if worker.is_running() && !worker.flush(self.flush_timeout)? {
                return Err(LoggerError::other(format!(
                    "timed out after {:?} waiting for batch upload",
                    self.flush_timeout
                )));
            }
        }
        self.take_batch_error()
    }

    /// Stop the batch worker after it uploads what is queued
    ///
    /// Returns `true` if the worker finished within `timeout`. Writes after
    /// shutdown fail with [`LoggerError::HookStopped`].
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        match self.worker {
            Some(ref mut worker) => worker.shutdown(timeout),
            None => true,
        }
    }

    pub fn is_batched(&self) -> bool {
        self.worker.is_some()
    }

    pub fn group(&self) -> &str {
        self.uploader.group()
    }

    pub fn stream(&self) -> &str {
        self.uploader.stream()
    }

    /// Token the next upload will present
    pub fn sequence_token(&self) -> Option<String> {
        self.uploader.sequence_token()
    }

    pub fn metrics(&self) -> &UploadMetrics {
        &self.metrics
    }
}

impl Appender for CloudWatchHook {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        self.fire(entry).map(|_| ())
    }

    fn flush(&mut self) -> Result<()> {
        CloudWatchHook::flush(self)
    }

    fn name(&self) -> &str {
        "cloudwatch"
    }

    fn levels(&self) -> &[LogLevel] {
        &self.levels
    }
}

impl io::Write for CloudWatchHook {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_message(buf).map_err(io::Error::other)
    }

    fn flush(&mut self) -> io::Result<()> {
        CloudWatchHook::flush(self).map_err(io::Error::other)
    }
}

impl Drop for CloudWatchHook {
    fn drop(&mut self) {
        if let Some(ref mut worker) = self.worker {
            if worker.is_running() {
                worker.shutdown(self.flush_timeout);
            }
        }

        if let Some(err) = self.last_error.lock().take() {
            eprintln!(
                "[LOGGER WARNING] CloudWatch hook for {}/{} dropped with an unreported upload error: {}",
                self.uploader.group(),
                self.uploader.stream(),
                err
            );
        }
    }
}
