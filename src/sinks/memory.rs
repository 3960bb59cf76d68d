//! In-memory sink for tests and inspection

use crate::core::Sink;
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Collects every record in memory
///
/// # Example
///
/// ```
/// use spark::{MemorySink, Sink};
///
/// let sink = MemorySink::new();
/// sink.write(b"first\n").unwrap();
/// sink.write(b"second\n").unwrap();
///
/// assert_eq!(sink.lines(), vec!["first", "second"]);
/// ```
#[derive(Debug)]
pub struct MemorySink {
    buffer: Mutex<Vec<u8>>,
    writes: AtomicUsize,
    flushes: AtomicUsize,
    name: String,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
            writes: AtomicUsize::new(0),
            flushes: AtomicUsize::new(0),
            name: "memory".to_string(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Drop the collected records, keeping the counters
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for MemorySink {
    fn write(&self, record: &[u8]) -> io::Result<()> {
        self.buffer.lock().extend_from_slice(record);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
