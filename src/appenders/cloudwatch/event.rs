//! Log events as the ingestion API sees them

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Bytes the service charges per event on top of the message
pub const EVENT_OVERHEAD_BYTES: usize = 26;

/// Largest single event, overhead included
pub const MAX_EVENT_BYTES: usize = 256 * 1024;

/// A timestamped message waiting to be uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub message: String,
}

impl LogEvent {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }

    /// Stamp a message with the current time
    pub fn now(message: impl Into<String>) -> Self {
        Self::new(Utc::now().timestamp_millis(), message)
    }

    /// Size counted against the request payload limit
    #[inline]
    pub fn encoded_size(&self) -> usize {
        self.message.len() + EVENT_OVERHEAD_BYTES
    }
}
