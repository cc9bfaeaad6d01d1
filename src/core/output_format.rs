//! Rendering of log entries into the message string shipped to CloudWatch
//!
//! - Text: `time=2025-01-08T10:30:45.123Z level=info msg="Request processed" user=alice`
//! - Json: `{"level":"info","msg":"Request processed","time":"2025-01-08T10:30:45.123Z","user":"alice"}`

use super::error::{LoggerError, Result};
use super::log_context::FieldValue;
use super::log_entry::LogEntry;
use chrono::SecondsFormat;
use serde_json::{Map, Value};

const TIME_KEY: &str = "time";
const LEVEL_KEY: &str = "level";
const MESSAGE_KEY: &str = "msg";
const FILE_KEY: &str = "file";

/// Output format for log entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Key=value pairs, context fields sorted by key (default)
    #[default]
    Text,

    /// One JSON object per entry, context fields merged at the top level
    Json,
}

impl OutputFormat {
    /// Format a log entry according to this output format
    pub fn format(&self, entry: &LogEntry) -> Result<String> {
        match self {
            OutputFormat::Text => Ok(self.format_text(entry)),
            OutputFormat::Json => self.format_json(entry),
        }
    }

    fn format_text(&self, entry: &LogEntry) -> String {
        let mut parts = vec![
            format!("{}={}", TIME_KEY, quote_value(&timestamp(entry))),
            format!("{}={}", LEVEL_KEY, entry.level.as_lowercase()),
            format!("{}={}", MESSAGE_KEY, quote_value(&entry.message)),
        ];

        if let Some(location) = location(entry) {
            parts.push(format!("{}={}", FILE_KEY, quote_value(&location)));
        }

        if let Some(ref context) = entry.context {
            for (key, value) in context.fields() {
                let rendered = match value {
                    FieldValue::String(s) => quote_value(s),
                    other => other.to_string(),
                };
                parts.push(format!("{}={}", escape_key(key), rendered));
            }
        }

        parts.join(" ")
    }

    fn format_json(&self, entry: &LogEntry) -> Result<String> {
        let mut object = Map::new();

        // Context first so the reserved keys win on collision
        if let Some(ref context) = entry.context {
            for (key, value) in context.fields() {
                object.insert(key.clone(), value.to_json_value());
            }
        }

        object.insert(TIME_KEY.to_string(), Value::String(timestamp(entry)));
        object.insert(
            LEVEL_KEY.to_string(),
            Value::String(entry.level.as_lowercase().to_string()),
        );
        object.insert(MESSAGE_KEY.to_string(), Value::String(entry.message.clone()));
        if let Some(location) = location(entry) {
            object.insert(FILE_KEY.to_string(), Value::String(location));
        }

        serde_json::to_string(&Value::Object(object))
            .map_err(|e| LoggerError::formatter("JSON", e.to_string()))
    }
}

/// `path:line` of the call site, when the entry recorded one
fn location(entry: &LogEntry) -> Option<String> {
    match (&entry.file, entry.line) {
        (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
        (Some(file), None) => Some(file.clone()),
        _ => None,
    }
}

fn timestamp(entry: &LogEntry) -> String {
    entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Keep only characters that are safe in a bare key
fn escape_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect()
}

/// Quote a value only when it would otherwise be ambiguous
fn quote_value(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '=' || c == '\\');

    if needs_quoting {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogContext, LogLevel};
    use chrono::{TimeZone, Utc};

    fn fixed_entry(level: LogLevel, message: &str) -> LogEntry {
        LogEntry::new(level, message)
            .with_timestamp(Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap())
    }

    #[test]
    fn test_text_format() {
        let entry = fixed_entry(LogLevel::Info, "Test message");
        let result = OutputFormat::Text.format(&entry).unwrap();

        assert_eq!(
            result,
            "time=2025-01-08T10:30:45.000Z level=info msg=\"Test message\""
        );
    }

    #[test]
    fn test_text_format_with_context() {
        let context = LogContext::new()
            .with_field("user_id", 123)
            .with_field("action", "log in");

        let entry = fixed_entry(LogLevel::Warn, "User logged in").with_context(context);
        let result = OutputFormat::Text.format(&entry).unwrap();

        assert!(result.contains("level=warning"));
        assert!(result.ends_with("action=\"log in\" user_id=123"));
    }

    #[test]
    fn test_text_format_escapes_quotes() {
        let context = LogContext::new().with_field("query", "SELECT \"a\" WHERE id=1");
        let entry = fixed_entry(LogLevel::Debug, "Query").with_context(context);
        let result = OutputFormat::Text.format(&entry).unwrap();

        assert!(result.contains(r#"query="SELECT \"a\" WHERE id=1""#));
    }

    #[test]
    fn test_json_format() {
        let entry = fixed_entry(LogLevel::Error, "Error occurred");
        let result = OutputFormat::Json.format(&entry).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["level"], "error");
        assert_eq!(parsed["msg"], "Error occurred");
        assert_eq!(parsed["time"], "2025-01-08T10:30:45.000Z");
    }

    #[test]
    fn test_json_format_with_context() {
        let context = LogContext::new()
            .with_field("event", "testevent")
            .with_field("latency_ms", 42)
            .with_field("msg", "shadowed");

        let entry = fixed_entry(LogLevel::Info, "Request completed").with_context(context);
        let result = OutputFormat::Json.format(&entry).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["event"], "testevent");
        assert_eq!(parsed["latency_ms"], 42);
        assert_eq!(parsed["msg"], "Request completed");
    }

    #[test]
    fn test_location_is_rendered() {
        let entry = fixed_entry(LogLevel::Info, "located").with_location("src/main.rs", 42);

        let text = OutputFormat::Text.format(&entry).unwrap();
        assert!(text.ends_with("msg=located file=src/main.rs:42"));

        let json = OutputFormat::Json.format(&entry).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["file"], "src/main.rs:42");
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }
}
