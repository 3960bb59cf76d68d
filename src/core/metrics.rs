//! Logger metrics for observability
//!
//! Counters describing how the core's writes, flushes and encodes went.
//! They are the out-of-band view of failures that are never returned from a
//! log call.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for one [`Core`](crate::core::Core)
///
/// # Example
///
/// ```
/// use spark::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_written();
/// metrics.record_write_failure();
///
/// assert_eq!(metrics.records_written(), 1);
/// assert_eq!(metrics.write_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records accepted by every sink
    records_written: AtomicU64,

    /// Individual sink writes that succeeded
    sink_writes: AtomicU64,

    /// Individual sink writes that failed or panicked
    write_failures: AtomicU64,

    /// Individual sink flushes that failed or panicked
    flush_failures: AtomicU64,

    /// Field values replaced by a placeholder during encoding
    encode_placeholders: AtomicU64,

    /// Sink calls that panicked (also counted as write or flush failures)
    sink_panics: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            records_written: AtomicU64::new(0),
            sink_writes: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
            encode_placeholders: AtomicU64::new(0),
            sink_panics: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_writes(&self) -> u64 {
        self.sink_writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_failures(&self) -> u64 {
        self.flush_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn encode_placeholders(&self) -> u64 {
        self.encode_placeholders.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_panics(&self) -> u64 {
        self.sink_panics.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_written(&self) -> u64 {
        self.records_written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_write(&self) -> u64 {
        self.sink_writes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_flush_failure(&self) -> u64 {
        self.flush_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_encode_placeholders(&self, count: u64) -> u64 {
        self.encode_placeholders.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_panic(&self) -> u64 {
        self.sink_panics.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed sink writes as a percentage of all per-sink write attempts
    /// (0.0 - 100.0)
    ///
    /// A record sent to two sinks counts as two attempts. Returns 0.0 if
    /// nothing has been written yet.
    pub fn write_failure_rate(&self) -> f64 {
        let failed = self.write_failures() as f64;
        let total = self.sink_writes() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.records_written.store(0, Ordering::Relaxed);
        self.sink_writes.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.flush_failures.store(0, Ordering::Relaxed);
        self.encode_placeholders.store(0, Ordering::Relaxed);
        self.sink_panics.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Snapshot of the current counter values
    fn clone(&self) -> Self {
        Self {
            records_written: AtomicU64::new(self.records_written()),
            sink_writes: AtomicU64::new(self.sink_writes()),
            write_failures: AtomicU64::new(self.write_failures()),
            flush_failures: AtomicU64::new(self.flush_failures()),
            encode_placeholders: AtomicU64::new(self.encode_placeholders()),
            sink_panics: AtomicU64::new(self.sink_panics()),
        }
    }
}
