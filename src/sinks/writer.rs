//! Sink over any `std::io::Write`

use crate::core::Sink;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Adapts a writer (a `File`, a socket, a `Vec<u8>`) into a [`Sink`]
///
/// Writes are serialised by an internal mutex; one record is written in a
/// single critical section.
///
/// # Example
///
/// ```no_run
/// use spark::{Logger, WriterSink};
/// use std::sync::Arc;
///
/// let sink = WriterSink::append_file("/var/log/app.log").unwrap();
/// let logger = Logger::builder().output(Arc::new(sink)).build().unwrap();
/// logger.info("started", &[]);
/// logger.sync().unwrap();
/// ```
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
    name: String,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            name: "writer".to_string(),
        }
    }

    /// Name reported in failure messages
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> WriterSink<BufWriter<W>> {
    /// Wrap `writer` in a [`BufWriter`]; data reaches it on flush
    pub fn buffered(writer: W) -> Self {
        Self::new(BufWriter::new(writer))
    }
}

impl WriterSink<BufWriter<File>> {
    /// Open `path` for appending, creating it if needed
    pub fn append_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::buffered(file).with_name(path.display().to_string()))
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&self, record: &[u8]) -> io::Result<()> {
        self.writer.lock().write_all(record)
    }

    fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
