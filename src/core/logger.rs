//! Host logger that fires entries at registered appenders

use super::{
    appender::Appender,
    error::Result,
    log_context::LogContext,
    log_entry::LogEntry,
    log_level::LogLevel,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct Logger {
    min_level: Arc<RwLock<LogLevel>>,
    appenders: Arc<RwLock<Vec<Box<dyn Appender>>>>,
    /// Entries that at least one appender failed to accept
    failed_count: AtomicU64,
    /// Entries every interested appender accepted
    logged_count: AtomicU64,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_level: Arc::new(RwLock::new(LogLevel::Info)),
            appenders: Arc::new(RwLock::new(Vec::new())),
            failed_count: AtomicU64::new(0),
            logged_count: AtomicU64::new(0),
        }
    }

    /// Fire an entry at every appender registered for its level
    ///
    /// Appender errors never reach the caller. They are reported on stderr
    /// and counted in [`failed_count`](Logger::failed_count).
    fn dispatch(&self, entry: &LogEntry) {
        let mut appenders = self.appenders.write();
        let mut has_error = false;

        for appender in appenders.iter_mut() {
            if !appender.levels().contains(&entry.level) {
                continue;
            }
            if let Err(e) = appender.append(entry) {
                eprintln!(
                    "[LOGGER ERROR] Failed to fire appender '{}': {}",
                    appender.name(),
                    e
                );
                has_error = true;
            }
        }

        if has_error {
            self.failed_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.logged_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn add_appender(&mut self, appender: Box<dyn Appender>) {
        self.appenders.write().push(appender);
    }

    pub fn set_min_level(&mut self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    pub fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if level < *self.min_level.read() {
            return;
        }

        self.dispatch(&LogEntry::new(level, message));
    }

    /// Log with structured context fields
    pub fn log_with_context(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        context: LogContext,
    ) {
        if level < *self.min_level.read() {
            return;
        }

        self.dispatch(&LogEntry::new(level, message).with_context(context));
    }

    /// Dispatch a prebuilt entry, still subject to the minimum level
    pub fn log_entry(&self, entry: &LogEntry) {
        if entry.level < *self.min_level.read() {
            return;
        }

        self.dispatch(entry);
    }

    /// Number of entries that at least one appender rejected
    pub fn failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }

    /// Number of entries delivered without appender errors
    pub fn logged_count(&self) -> u64 {
        self.logged_count.load(Ordering::Relaxed)
    }

    /// Flush every appender, stopping at the first error
    pub fn flush(&self) -> Result<()> {
        let mut appenders = self.appenders.write();
        for appender in appenders.iter_mut() {
            appender.flush()?;
        }
        Ok(())
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Helper for structured info logging
    pub fn info_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Info, message, context);
    }

    /// Helper for structured error logging
    pub fn error_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Error, message, context);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let failed = self.failed_count();
        if failed > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} entries that failed to reach an appender",
                failed
            );
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use cloudwatch_log_hook::prelude::*;
/// use std::sync::Arc;
///
/// let client = Arc::new(MemoryLogsClient::new());
/// let hook = CloudWatchHook::new(client, "app", "web-1", HookOptions::new()).unwrap();
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .appender(hook)
///     .build();
/// logger.info("shipped immediately");
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    appenders: Vec<Box<dyn Appender>>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            appenders: Vec::new(),
        }
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Add an appender
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        let mut logger = Logger::new();
        logger.set_min_level(self.min_level);
        for appender in self.appenders {
            logger.add_appender(appender);
        }
        logger
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}
