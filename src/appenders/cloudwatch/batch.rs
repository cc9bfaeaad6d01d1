//! Size- and count-bounded batch assembly
//!
//! A `PutLogEvents` request may carry at most 10,000 events and 1 MiB of
//! payload, where each event costs its message length plus a fixed overhead.
//! [`BatchAssembler`] accumulates events and hands back a finished batch as
//! soon as the next event would push it past either ceiling.

use super::event::{LogEvent, MAX_EVENT_BYTES};
use crate::core::{LoggerError, Result};

/// Maximum events in one request
pub const MAX_BATCH_EVENTS: usize = 10_000;

/// Maximum encoded bytes in one request
pub const MAX_BATCH_BYTES: usize = 1024 * 1024;

/// Ceilings applied to each batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_events: usize,
    pub max_bytes: usize,
}

impl BatchLimits {
    /// Limits tighter than the service defaults, mostly for tests
    ///
    /// Values above the service limits are rejected.
    pub fn new(max_events: usize, max_bytes: usize) -> Result<Self> {
        if max_events == 0 || max_events > MAX_BATCH_EVENTS {
            return Err(LoggerError::config(
                "BatchLimits",
                format!("max_events must be in 1..={}, got {}", MAX_BATCH_EVENTS, max_events),
            ));
        }
        if max_bytes == 0 || max_bytes > MAX_BATCH_BYTES {
            return Err(LoggerError::config(
                "BatchLimits",
                format!("max_bytes must be in 1..={}, got {}", MAX_BATCH_BYTES, max_bytes),
            ));
        }
        Ok(Self {
            max_events,
            max_bytes,
        })
    }

    /// Largest single event that can ever be sent under these limits
    pub fn max_event_bytes(&self) -> usize {
        self.max_bytes.min(MAX_EVENT_BYTES)
    }

    /// Reject events that could never fit in a batch
    pub fn check_event(&self, event: &LogEvent) -> Result<()> {
        let size = event.encoded_size();
        let max = self.max_event_bytes();
        if size > max {
            return Err(LoggerError::event_too_large(size, max));
        }
        Ok(())
    }
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_events: MAX_BATCH_EVENTS,
            max_bytes: MAX_BATCH_BYTES,
        }
    }
}

/// An ordered group of events sent in one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    events: Vec<LogEvent>,
    size_bytes: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Encoded size of all events, overhead included
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<LogEvent> {
        self.events
    }
}

/// Accumulates events into batches that respect [`BatchLimits`]
#[derive(Debug)]
pub struct BatchAssembler {
    limits: BatchLimits,
    current: Batch,
}

impl BatchAssembler {
    pub fn new(limits: BatchLimits) -> Self {
        Self {
            limits,
            current: Batch::default(),
        }
    }

    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    /// Add an event, returning the previous batch if the event did not fit
    ///
    /// The returned batch is complete and ready to upload; `event` becomes
    /// the first member of the next one.
    pub fn push(&mut self, event: LogEvent) -> Option<Batch> {
        let size = event.encoded_size();
        let full = !self.current.is_empty()
            && (self.current.size_bytes + size > self.limits.max_bytes
                || self.current.len() >= self.limits.max_events);

        let finished = if full { Some(self.take()) } else { None };

        self.current.size_bytes += size;
        self.current.events.push(event);
        finished
    }

    /// Take whatever has accumulated, leaving the assembler empty
    pub fn take(&mut self) -> Batch {
        std::mem::take(&mut self.current)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.current.size_bytes
    }
}
