//! Log entry structure

use super::log_context::{FieldValue, LogContext};
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

thread_local! {
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn current_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// A single log record as it travels from the logger to its appenders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub thread_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<LogContext>,
}

impl LogEntry {
    /// Escape newlines, carriage returns and tabs so one entry stays one line
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: Self::sanitize_message(&message.into()),
            timestamp: Utc::now(),
            file: None,
            line: None,
            thread_name: current_thread_name(),
            context: None,
        }
    }

    pub fn with_location(mut self, file: &str, line: u32) -> Self {
        self.file = Some(file.to_string());
        self.line = Some(line);
        self
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Attach a single structured field, creating the context on first use
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.context
            .get_or_insert_with(LogContext::new)
            .add_field(key, value);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Milliseconds since the Unix epoch, the resolution CloudWatch stores
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_message_is_sanitized() {
        let entry = LogEntry::new(LogLevel::Info, "line one\nline two\tend\r");
        assert_eq!(entry.message, "line one\\nline two\\tend\\r");
    }

    #[test]
    fn test_with_field_creates_context() {
        let entry = LogEntry::new(LogLevel::Info, "msg")
            .with_field("topic", "orders")
            .with_field("attempt", 2);

        let context = entry.context.expect("context should be created");
        assert_eq!(context.len(), 2);
    }

    #[test]
    fn test_timestamp_millis() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let entry = LogEntry::new(LogLevel::Warn, "msg").with_timestamp(ts);
        assert_eq!(entry.timestamp_millis(), ts.timestamp_millis());
    }
}
