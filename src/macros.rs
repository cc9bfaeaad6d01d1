//! Logging macros with `format!`-style arguments
//!
//! Entries carry the call site's file and line. Each macro optionally
//! takes structured fields in braces before the message; they end up in
//! the entry's [`LogContext`](crate::LogContext) and are shipped as
//! `key=value` pairs or JSON keys depending on the hook's formatter.
//!
//! # Examples
//!
//! ```
//! use cloudwatch_log_hook::prelude::*;
//! use cloudwatch_log_hook::info;
//! use std::sync::Arc;
//!
//! let client = Arc::new(MemoryLogsClient::new());
//! let hook = CloudWatchHook::new(client.clone(), "app", "web-1", HookOptions::new()).unwrap();
//! let logger = Logger::builder().appender(hook).build();
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! info!(logger, { "user_id" => 42, "action" => "login" }, "User signed in");
//!
//! let events = client.events("app", "web-1");
//! assert!(events[1].message.contains("action=login"));
//! ```

/// Log a message at an explicit level.
///
/// ```
/// # use cloudwatch_log_hook::prelude::*;
/// # let logger = Logger::new();
/// use cloudwatch_log_hook::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, { "code" => 500 }, "Request failed: {}", "timeout");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, { $($key:expr => $value:expr),+ $(,)? }, $($arg:tt)+) => {
        $logger.log_entry(
            &$crate::LogEntry::new($level, format!($($arg)+))
                .with_location(file!(), line!())
                .with_context($crate::LogContext::new()$(.with_field($key, $value))+),
        )
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_entry(
            &$crate::LogEntry::new($level, format!($($arg)+)).with_location(file!(), line!()),
        )
    };
}

/// Log a trace-level message.
///
/// The default hook levels leave trace out; enable it with
/// [`HookOptions::with_levels`](crate::HookOptions::with_levels).
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// ```
/// # use cloudwatch_log_hook::prelude::*;
/// # let logger = Logger::new();
/// use cloudwatch_log_hook::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
///
/// Only logs; the process keeps running.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
