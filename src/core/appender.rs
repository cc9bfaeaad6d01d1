//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry, log_level::LogLevel};

/// A destination the logger fires every accepted entry at.
///
/// The logger only calls [`append`](Appender::append) for levels listed by
/// [`levels`](Appender::levels).
pub trait Appender: Send + Sync {
    fn append(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;

    fn levels(&self) -> &[LogLevel] {
        &LogLevel::ALL
    }
}
