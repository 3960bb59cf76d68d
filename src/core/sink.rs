//! Sink trait for log output destinations

use std::io;

/// A destination for finished, encoded records
///
/// `write` receives exactly one complete record per call. Implementations
/// that are not inherently concurrent-safe must serialise calls internally
/// so a record is never interleaved with another one.
pub trait Sink: Send + Sync {
    fn write(&self, record: &[u8]) -> io::Result<()>;

    /// Push buffered data to durable storage
    fn flush(&self) -> io::Result<()>;

    fn name(&self) -> &str {
        "sink"
    }
}
