//! Upload metrics for observability
//!
//! Counters describing how the CloudWatch hook has been shipping events:
//! how many were accepted, uploaded, or lost to failed requests, and what
//! triggered each batch.

use std::sync::atomic::{AtomicU64, Ordering};

/// Why a batch left the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// The next event would have overflowed the count or byte ceiling
    Full,
    /// The batch interval elapsed
    Timer,
    /// `flush()` was called
    Requested,
    /// The hook is shutting down and drained its queue
    Shutdown,
}

/// Metrics for hook observability
///
/// # Example
///
/// ```
/// use cloudwatch_log_hook::UploadMetrics;
///
/// let metrics = UploadMetrics::new();
/// metrics.record_accepted();
/// metrics.record_upload(1);
///
/// assert_eq!(metrics.events_uploaded(), 1);
/// assert_eq!(metrics.requests_sent(), 1);
/// ```
#[derive(Debug)]
pub struct UploadMetrics {
    /// Events accepted by the write path
    events_accepted: AtomicU64,

    /// Events the service acknowledged
    events_uploaded: AtomicU64,

    /// Events lost with a failed request
    events_failed: AtomicU64,

    /// Successful put requests
    requests_sent: AtomicU64,

    /// Failed put requests
    requests_failed: AtomicU64,

    full_flushes: AtomicU64,
    timer_flushes: AtomicU64,
    requested_flushes: AtomicU64,
    shutdown_flushes: AtomicU64,
}

impl UploadMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            events_accepted: AtomicU64::new(0),
            events_uploaded: AtomicU64::new(0),
            events_failed: AtomicU64::new(0),
            requests_sent: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            full_flushes: AtomicU64::new(0),
            timer_flushes: AtomicU64::new(0),
            requested_flushes: AtomicU64::new(0),
            shutdown_flushes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn events_accepted(&self) -> u64 {
        self.events_accepted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn events_uploaded(&self) -> u64 {
        self.events_uploaded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn events_failed(&self) -> u64 {
        self.events_failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn requests_failed(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    /// Number of batches that left the assembler for the given reason
    pub fn flushes(&self, reason: FlushReason) -> u64 {
        self.flush_counter(reason).load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_accepted(&self) -> u64 {
        self.events_accepted.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a successful put of `events` events
    #[inline]
    pub fn record_upload(&self, events: usize) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        self.events_uploaded.fetch_add(events as u64, Ordering::Relaxed);
    }

    /// Record a failed put of `events` events
    #[inline]
    pub fn record_failure(&self, events: usize) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.events_failed.fetch_add(events as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flush(&self, reason: FlushReason) {
        self.flush_counter(reason).fetch_add(1, Ordering::Relaxed);
    }

    /// Share of accepted events that were lost, as a percentage (0.0 - 100.0)
    pub fn failure_rate(&self) -> f64 {
        let failed = self.events_failed() as f64;
        let total = self.events_uploaded() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    fn flush_counter(&self, reason: FlushReason) -> &AtomicU64 {
        match reason {
            FlushReason::Full => &self.full_flushes,
            FlushReason::Timer => &self.timer_flushes,
            FlushReason::Requested => &self.requested_flushes,
            FlushReason::Shutdown => &self.shutdown_flushes,
        }
    }
}

impl Default for UploadMetrics {
    fn default() -> Self {
        Self::new()
    }
}
